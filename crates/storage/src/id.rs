use sha2::{Digest, Sha256};

use demandcast_core::ForecastRecord;

/// Derive a lookup id for a new record: sha-256 over the identifying
/// fields plus a per-store sequence number, truncated to 16 hex chars.
///
/// The sequence number keeps ids distinct when the same file is uploaded
/// twice within one timestamp tick.
pub(crate) fn record_id(record: &ForecastRecord, seq: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(record.filename.as_bytes());
    hasher.update(record.uploaded_at.as_bytes());
    hasher.update(seq.to_be_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ForecastRecord {
        ForecastRecord {
            filename: "a.csv".into(),
            uploaded_at: "2023-01-01T00:00:00Z".into(),
            historical: vec![],
            predictions: vec![],
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn ids_are_stable_hex_and_sequence_distinct() {
        let r = record();
        let a = record_id(&r, 1);
        let b = record_id(&r, 2);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_eq!(a, record_id(&r, 1));
    }
}
