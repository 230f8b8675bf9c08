use std::io::Write;
use tempfile::NamedTempFile;

/// Writes a JSON fixture for the billcart binary and keeps the temp file
/// alive for the caller.
pub fn write_fixture(fixture: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string_pretty(fixture).unwrap().as_bytes())
        .unwrap();
    file.flush().unwrap();
    file
}

/// A two-source fixture: one assessment bill (B1, RM120.00) and one traffic
/// compound (B2, RM50.00), both outstanding.
pub fn cross_source_fixture() -> serde_json::Value {
    serde_json::json!({
        "bills": [
            {
                "source": "assessment",
                "id": "A1",
                "bill_no": "B1",
                "amount": "120.00",
                "due_date": "2026-09-30",
                "meta": { "account_no": "ACC-1" }
            },
            {
                "source": "compound",
                "id": "C1",
                "bill_no": "B2",
                "amount": "50.00"
            }
        ],
        "ledger": []
    })
}
