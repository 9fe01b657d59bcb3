//! Hidden support tables the assistant reads and appends to.
//!
//! Creating them is the host's job; see `gridwise_engine::Workbook::with_support_tables`.

/// Name, home sheet and header row of a support table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportTable {
    pub name: &'static str,
    pub sheet: &'static str,
    pub headers: &'static [&'static str],
}

impl SupportTable {
    pub const AUDIT: SupportTable = SupportTable {
        name: "tblAudit",
        sheet: "_AUDIT",
        headers: &["Time", "Intent", "Args", "Range", "Notes"],
    };

    pub const UNDO_INDEX: SupportTable = SupportTable {
        name: "tblUndoIndex",
        sheet: "_UNDO",
        headers: &["Key", "Time", "Sheet", "Address", "Rows", "Cols", "Note"],
    };

    pub const UNDO_DATA: SupportTable = SupportTable {
        name: "tblUndoData",
        sheet: "_UNDO_DATA",
        headers: &["Key", "ValuesJson", "FormulasJson", "FormatsJson"],
    };

    pub const FX_CNB: SupportTable = SupportTable {
        name: "tblFxCnb",
        sheet: "_FX_CNB",
        headers: &["Date", "Code", "Rate"],
    };

    pub const HOLIDAYS_CZ: SupportTable = SupportTable {
        name: "tblHolidaysCz",
        sheet: "_HOLIDAYS_CZ",
        headers: &["Date", "Name"],
    };

    pub const TELEMETRY: SupportTable = SupportTable {
        name: "tblTelemetry",
        sheet: "_TELEMETRY",
        headers: &["Time", "Event", "Intent", "Detail"],
    };

    pub const ALL: [SupportTable; 6] = [
        Self::AUDIT,
        Self::UNDO_INDEX,
        Self::UNDO_DATA,
        Self::FX_CNB,
        Self::HOLIDAYS_CZ,
        Self::TELEMETRY,
    ];

    /// Column offset of a header within the table, if present.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| *h == header)
    }
}
