//! Invocation-form synthesis and the supported output-format table.
//!
//! Every generated report owns one editable form definition: the filter
//! fields derived from its data contract plus a fixed scaffold (hidden
//! design-file path, hidden output base name, hidden source identity, and
//! the output-format drop-down). The scaffold is system-managed; user
//! edits to the form are spliced back around it, never over it.
//!
//! The format table below is the single authority for supported output
//! MIME types. The form drop-down and export validation both consult it,
//! so the two cannot drift apart.

use std::path::Path;

use thiserror::Error;

use crate::provenance::SourceKind;
use crate::schema::ReportDataContract;

/// Result type for form synthesis.
pub type FormResult<T> = Result<T, FormError>;

/// Errors raised while building or rewriting a form definition.
#[derive(Error, Debug)]
pub enum FormError {
    /// The supplied form text is missing an expected structural marker.
    #[error("malformed form text: {0}")]
    Malformed(String),
}

/// One supported output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    /// MIME content type as requested by callers.
    pub mime: &'static str,
    /// Output format name understood by the rendering engine.
    pub format: &'static str,
    /// File extension, without the dot.
    pub extension: &'static str,
    /// Human-readable description shown in the drop-down.
    pub description: &'static str,
}

/// The fixed table of supported output formats, in drop-down order.
pub const OUTPUT_FORMATS: [OutputFormat; 12] = [
    OutputFormat { mime: "text/html", format: "html", extension: "html", description: "Text (.html)" },
    OutputFormat { mime: "application/pdf", format: "pdf", extension: "pdf", description: "Pdf (.pdf)" },
    OutputFormat { mime: "application/postscript", format: "postscript", extension: "ps", description: "Postscript (.ps)" },
    OutputFormat { mime: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", format: "xlsx", extension: "xlsx", description: "Excel (.xlsx)" },
    OutputFormat { mime: "application/vnd.openxmlformats-officedocument.wordprocessingml.document", format: "docx", extension: "docx", description: "Word (.docx)" },
    OutputFormat { mime: "application/vnd.openxmlformats-officedocument.presentationml.presentation", format: "pptx", extension: "pptx", description: "Powerpoint (.pptx)" },
    OutputFormat { mime: "application/vnd.ms-excel", format: "xls", extension: "xls", description: "Excel (.xls)" },
    OutputFormat { mime: "application/vnd.ms-word", format: "doc", extension: "doc", description: "Word (.doc)" },
    OutputFormat { mime: "application/vnd.ms-powerpoint", format: "ppt", extension: "ppt", description: "Powerpoint (.ppt)" },
    OutputFormat { mime: "application/vnd.oasis.opendocument.spreadsheet", format: "ods", extension: "ods", description: "LibreOffice Calc (.ods)" },
    OutputFormat { mime: "application/vnd.oasis.opendocument.text", format: "odt", extension: "odt", description: "LibreOffice Writer (.odt)" },
    OutputFormat { mime: "application/vnd.oasis.opendocument.presentation", format: "odp", extension: "odp", description: "LibreOffice Impress (.odp)" },
];

/// Look up a supported format by MIME content type (case-insensitive).
pub fn format_for_mime(content_type: &str) -> Option<&'static OutputFormat> {
    let wanted = content_type.trim().to_ascii_lowercase();
    OUTPUT_FORMATS.iter().find(|f| f.mime == wanted)
}

/// The system-managed scaffold fields appended to every report form.
#[derive(Debug, Clone)]
pub struct StandardFields<'a> {
    /// Resolved storage path of the design file.
    pub design_path: &'a Path,
    /// Output file name, minus extension.
    pub output_base: &'a str,
    /// Which data source produced the report.
    pub source_kind: SourceKind,
    pub source_name: &'a str,
}

impl StandardFields<'_> {
    /// Render the scaffold: three hidden fields, the format drop-down,
    /// and the trailing sort-order on the format field.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "<field name=\"designFile\"><hidden value=\"{}\"/></field>",
            escape_attr(&self.design_path.display().to_string())
        ));
        out.push_str(&format!(
            "<field name=\"outputName\"><hidden value=\"{}\"/></field>",
            escape_attr(self.output_base)
        ));
        out.push_str(&format!(
            "<field name=\"{}\"><hidden value=\"{}\"/></field>",
            self.source_kind.field_name(),
            escape_attr(self.source_name)
        ));
        out.push_str("<field name=\"outputFormat\" title=\"${uiLabelMap.outputFormat}\"><drop-down>");
        for format in &OUTPUT_FORMATS {
            out.push_str(&format!(
                "<option key=\"{}\" description=\"{}\"/>",
                format.mime,
                escape_attr(format.description)
            ));
        }
        out.push_str("</drop-down></field>");
        out.push_str("<sort-order><sort-field name=\"outputFormat\"/></sort-order>");
        out
    }
}

const FORMS_PREAMBLE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><forms>";
const FORMS_CLOSE: &str = "</forms>";

/// Synthesize the invocation form for a freshly generated report.
///
/// A single-record form extending the master form, with one find field
/// per filter sub-field when `write_filters` is set, followed by the
/// standard scaffold.
pub fn synthesize_form(
    master_name: &str,
    contract: &ReportDataContract,
    design_base: &str,
    standard: &StandardFields<'_>,
    write_filters: bool,
) -> String {
    let mut out = String::from(FORMS_PREAMBLE);
    out.push_str(&format!(
        "<form name=\"{}_{}\" type=\"single\" extends=\"{}\">",
        escape_attr(master_name),
        escape_attr(design_base),
        escape_attr(master_name)
    ));
    if write_filters {
        for (field, _) in &contract.filter_map {
            let label = contract
                .filter_labels
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, l)| l.as_str())
                .unwrap_or(field);
            out.push_str(&format!(
                "<field name=\"{}\" title=\"{}\"><text-find/></field>",
                escape_attr(field),
                escape_attr(label)
            ));
        }
    }
    out.push_str(&standard.render());
    out.push_str("</form>");
    out.push_str(FORMS_CLOSE);
    out
}

/// Strip the document wrapper and system scaffold from a stored form
/// body, leaving only the user-editable `<form>` element for display and
/// override editing. The output round-trips through
/// [`splice_standard_fields`], which re-adds both.
pub fn form_for_display(body: &str) -> FormResult<String> {
    let start = body
        .find("<field name=\"designFile\">")
        .ok_or_else(|| FormError::Malformed("no scaffold fields found".to_string()))?;
    let end_marker = "</sort-order>";
    let end = body
        .find(end_marker)
        .ok_or_else(|| FormError::Malformed("no sort-order found".to_string()))?
        + end_marker.len();
    if end < start {
        return Err(FormError::Malformed("scaffold out of order".to_string()));
    }
    let mut stripped = String::with_capacity(body.len());
    stripped.push_str(&body[..start]);
    stripped.push_str(&body[end..]);
    let stripped = stripped
        .strip_prefix(FORMS_PREAMBLE)
        .ok_or_else(|| FormError::Malformed("no document preamble".to_string()))?
        .strip_suffix(FORMS_CLOSE)
        .ok_or_else(|| FormError::Malformed("no closing forms tag".to_string()))?;
    // Shown in an editor: dollar expansions must arrive inert.
    Ok(stripped.replace('$', "&#36;"))
}

/// Rebuild a complete form document from user-edited form text by
/// re-appending the standard scaffold before the closing form tag.
pub fn splice_standard_fields(
    override_text: &str,
    standard: &StandardFields<'_>,
) -> FormResult<String> {
    let end = override_text
        .find("</form>")
        .ok_or_else(|| FormError::Malformed("no closing form tag".to_string()))?;
    let mut out = String::from(FORMS_PREAMBLE);
    out.push_str(&override_text[..end]);
    out.push_str(&standard.render());
    out.push_str(&override_text[end..]);
    out.push_str(FORMS_CLOSE);
    Ok(out)
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
