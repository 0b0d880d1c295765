//! Output formatting for price records (table, JSON, markdown, CSV).

use crate::alsuper::models::PriceRecord;
use crate::config::OutputFormat;

/// Formats price records for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single record.
    pub fn format_record(&self, record: &PriceRecord) -> String {
        match self.format {
            OutputFormat::Json => self.json_single(record),
            OutputFormat::Table => self.table_single(record),
            OutputFormat::Markdown => self.markdown_single(record),
            OutputFormat::Csv => self.csv_records(std::slice::from_ref(record)),
        }
    }

    /// Formats multiple records.
    pub fn format_records(&self, records: &[PriceRecord]) -> String {
        if records.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No prices found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_records(records),
            OutputFormat::Table => self.table_records(records),
            OutputFormat::Markdown => self.markdown_records(records),
            OutputFormat::Csv => self.csv_records(records),
        }
    }

    /// "MXN 45.90 / kg" style price label.
    fn price_label(record: &PriceRecord) -> String {
        format!("{} {:.2} / {}", record.currency, record.price(), record.raw_unit)
    }

    fn pack_label(record: &PriceRecord) -> Option<String> {
        match (record.unit_pack_size, record.unit_weight_g) {
            (Some(n), Some(g)) => Some(format!("{} x {} g", n, g)),
            (Some(n), None) if n > 1 => Some(format!("{} units", n)),
            (None, Some(g)) => Some(format!("{} g", g)),
            _ => None,
        }
    }

    // JSON formatting

    fn json_single(&self, record: &PriceRecord) -> String {
        serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
    }

    fn json_records(&self, records: &[PriceRecord]) -> String {
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_single(&self, record: &PriceRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Name:    {}", record.product_name.as_deref().unwrap_or("N/A")));
        lines.push(format!("URL:     {}", record.url));
        lines.push(format!("Price:   {}", Self::price_label(record)));

        if let Some(pack) = Self::pack_label(record) {
            lines.push(format!("Pack:    {}", pack));
        }

        lines.join("\n")
    }

    fn table_records(&self, records: &[PriceRecord]) -> String {
        let price_width = 12;
        let unit_width = 9;
        let name_width = 50;

        let mut lines = Vec::new();

        lines.push(format!("{:<price_width$}  {:<unit_width$}  {}", "Price", "Unit", "Name"));
        lines.push(format!("{:-<price_width$}  {:-<unit_width$}  {:-<name_width$}", "", "", ""));

        for record in records {
            let name = record.product_name.as_deref().unwrap_or("N/A");
            let name = if name.chars().count() > name_width {
                let cut: String = name.chars().take(name_width - 3).collect();
                format!("{}...", cut)
            } else {
                name.to_string()
            };

            lines.push(format!(
                "{:>price_width$.2}  {:<unit_width$}  {}",
                record.price(),
                record.raw_unit.as_str(),
                name
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} prices", records.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_single(&self, record: &PriceRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", record.product_name.as_deref().unwrap_or("Unknown product")));
        lines.push(String::new());
        lines.push(format!("- **Price:** {}", Self::price_label(record)));

        if let Some(pack) = Self::pack_label(record) {
            lines.push(format!("- **Pack:** {}", pack));
        }

        lines.push(format!("- **URL:** [View on Alsuper]({})", record.url));

        lines.join("\n")
    }

    fn markdown_records(&self, records: &[PriceRecord]) -> String {
        let mut lines = Vec::new();

        lines.push("| Price | Unit | Name |".to_string());
        lines.push("|-------|------|------|".to_string());

        for record in records {
            lines.push(format!(
                "| {:.2} | {} | [{}]({}) |",
                record.price(),
                record.raw_unit,
                record.product_name.as_deref().unwrap_or("N/A"),
                record.url
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} prices found*", records.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "url,product_name,price_per_kg,unit_price,unit_pack_size,unit_weight_g,currency,raw_unit"
            .to_string()
    }

    fn csv_records(&self, records: &[PriceRecord]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for record in records {
            let name = record.product_name.as_deref().map(Self::csv_escape).unwrap_or_default();

            lines.push(format!(
                "{},{},{},{},{},{},{},{}",
                Self::csv_escape(&record.url),
                name,
                Self::csv_opt(record.price_per_kg),
                Self::csv_opt(record.unit_price),
                Self::csv_opt(record.unit_pack_size),
                Self::csv_opt(record.unit_weight_g),
                record.currency,
                record.raw_unit
            ));
        }

        lines.join("\n")
    }

    fn csv_opt<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
