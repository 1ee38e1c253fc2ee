//! Payout list ingestion.
//!
//! The upstream pipeline (balance indexing, share normalization) exports
//! a CSV of `recipient,amount[,mint]` rows in base units. Ingestion
//! assigns the dense 0-based leaf index in file order; that index is
//! positional and committed to by the artifact, so rows are never
//! reordered or combined.

use std::{fs::File, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::error::MerkleTreeError;

/// One CSV row as exported by the payout pipeline.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CsvEntry {
    /// Base58 recipient account.
    pub recipient: String,
    /// Amount in base units.
    pub amount: u64,
    /// Optional mint column; when present every row must carry the
    /// distribution's mint.
    #[serde(default)]
    pub mint: Option<String>,
}

impl CsvEntry {
    pub fn new_from_file(path: &Path) -> Result<Vec<Self>, MerkleTreeError> {
        let file = File::open(path)?;
        let mut rdr = csv::Reader::from_reader(file);

        let mut entries = Vec::new();
        for row in rdr.deserialize() {
            let record: CsvEntry = row?;
            entries.push(record);
        }

        Ok(entries)
    }
}

/// One validated payout, placed at its leaf index.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PayoutEntry {
    /// Leaf position, dense and 0-based.
    pub index: u64,
    pub recipient: Pubkey,
    pub amount: u64,
}

/// Validate raw CSV rows and assign leaf indices in file order.
pub fn ingest(entries: &[CsvEntry], mint: &Pubkey) -> Result<Vec<PayoutEntry>, MerkleTreeError> {
    if entries.is_empty() {
        return Err(MerkleTreeError::InvalidInput(
            "payout list is empty".to_string(),
        ));
    }

    let mut out = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let recipient = Pubkey::from_str(&entry.recipient).map_err(|_| {
            MerkleTreeError::InvalidInput(format!(
                "row {}: {} is not a valid account",
                i, entry.recipient
            ))
        })?;

        if entry.amount == 0 {
            return Err(MerkleTreeError::InvalidInput(format!(
                "row {}: zero amount for {}",
                i, entry.recipient
            )));
        }

        if let Some(row_mint) = &entry.mint {
            let row_mint = Pubkey::from_str(row_mint).map_err(|_| {
                MerkleTreeError::InvalidInput(format!("row {}: invalid mint {}", i, row_mint))
            })?;
            if row_mint != *mint {
                return Err(MerkleTreeError::InvalidInput(format!(
                    "row {}: mixed mint {} (distribution mint is {})",
                    i, row_mint, mint
                )));
            }
        }

        out.push(PayoutEntry {
            index: i as u64,
            recipient,
            amount: entry.amount,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn row(recipient: Pubkey, amount: u64) -> CsvEntry {
        CsvEntry {
            recipient: recipient.to_string(),
            amount,
            mint: None,
        }
    }

    #[test]
    fn assigns_dense_indices_in_order() {
        let mint = Pubkey::new_unique();
        let rows = vec![
            row(Pubkey::new_unique(), 100),
            row(Pubkey::new_unique(), 200),
            row(Pubkey::new_unique(), 300),
        ];
        let entries = ingest(&rows, &mint).unwrap();
        assert_eq!(entries.len(), 3);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.index, i as u64);
        }
    }

    #[test]
    fn rejects_zero_amount() {
        let mint = Pubkey::new_unique();
        let rows = vec![row(Pubkey::new_unique(), 0)];
        assert!(matches!(
            ingest(&rows, &mint),
            Err(MerkleTreeError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_malformed_recipient() {
        let mint = Pubkey::new_unique();
        let rows = vec![CsvEntry {
            recipient: "not-a-pubkey".to_string(),
            amount: 10,
            mint: None,
        }];
        assert!(matches!(
            ingest(&rows, &mint),
            Err(MerkleTreeError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_mixed_mint() {
        let mint = Pubkey::new_unique();
        let rows = vec![
            CsvEntry {
                recipient: Pubkey::new_unique().to_string(),
                amount: 10,
                mint: Some(mint.to_string()),
            },
            CsvEntry {
                recipient: Pubkey::new_unique().to_string(),
                amount: 10,
                mint: Some(Pubkey::new_unique().to_string()),
            },
        ];
        let err = ingest(&rows, &mint).unwrap_err();
        assert!(err.to_string().contains("mixed mint"));
    }

    #[test]
    fn rejects_empty_list() {
        let mint = Pubkey::new_unique();
        assert!(matches!(
            ingest(&[], &mint),
            Err(MerkleTreeError::InvalidInput(_))
        ));
    }

    #[test]
    fn duplicate_recipients_stay_positional() {
        let mint = Pubkey::new_unique();
        let dup = Pubkey::new_unique();
        let rows = vec![row(dup, 100), row(dup, 50)];
        let entries = ingest(&rows, &mint).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].amount, 100);
        assert_eq!(entries[1].amount, 50);
    }

    #[test]
    fn parses_csv_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("l33_payouts_test.csv");
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let mut file = File::create(&path).unwrap();
        writeln!(file, "recipient,amount").unwrap();
        writeln!(file, "{a},1000").unwrap();
        writeln!(file, "{b},2500").unwrap();
        drop(file);

        let rows = CsvEntry::new_from_file(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].recipient, a.to_string());
        assert_eq!(rows[1].amount, 2500);
        std::fs::remove_file(&path).ok();
    }
}
