use crate::estimator::summarize;
use crate::models::{Comparison, EmissionResult};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::io::BufWriter;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF error: {0}")] Pdf(String),
}

/// Text-only A4 summary of a footprint result.
pub fn generate_report(result: &EmissionResult) -> Result<Vec<u8>, ReportError> {
    let summary = summarize(result);
    let (doc, page, layer) = PdfDocument::new("Carbon Footprint Results", Mm(210.0), Mm(297.0), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| ReportError::Pdf(e.to_string()))?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(|e| ReportError::Pdf(e.to_string()))?;
    let canvas = doc.get_page(page).get_layer(layer);

    canvas.use_text("Your Carbon Footprint Results", 20.0, Mm(15.0), Mm(275.0), &bold);
    canvas.use_text(format!("Total: {} kg CO2e per month", result.total_emissions), 14.0, Mm(15.0), Mm(260.0), &font);
    let comparison = match summary.comparison {
        Comparison::Higher => "higher",
        Comparison::Lower => "lower",
    };
    canvas.use_text(
        format!("This is {} than the average person's footprint ({} kg).", comparison, summary.average_monthly_kg),
        10.0, Mm(15.0), Mm(252.0), &font,
    );

    canvas.use_text("Breakdown", 14.0, Mm(15.0), Mm(238.0), &bold);
    let mut y = 230.0;
    for share in &summary.shares {
        canvas.use_text(format!("{}: {} kg CO2e ({}%)", share.label, share.kg, share.percent), 11.0, Mm(20.0), Mm(y), &font);
        y -= 7.0;
    }

    y -= 6.0;
    canvas.use_text("Recommendations", 14.0, Mm(15.0), Mm(y), &bold);
    for recommendation in &result.recommendations {
        y -= 8.0;
        canvas.use_text(format!("- {}", truncate(recommendation, 90)), 10.0, Mm(20.0), Mm(y), &font);
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buf);
        doc.save(&mut writer).map_err(|e| ReportError::Pdf(e.to_string()))?;
    }
    Ok(buf)
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
