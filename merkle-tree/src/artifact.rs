//! The distribution artifact: the one serializable record committing a
//! payout round.
//!
//! The artifact is written once at build time and read-only afterwards.
//! On the wire, 32-byte values are hex strings and amounts are base-10
//! strings so u64 precision survives text transport.

use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use l33_merkle_verify::verify;
use serde::{Deserialize, Serialize};
use solana_program::{keccak::hashv, pubkey::Pubkey};

use crate::{
    error::MerkleTreeError,
    leaf::{derive_distribution_id, leaf_hash},
    merkle_tree::MerkleTree,
    payout_entry::PayoutEntry,
};

/// Bumped on any breaking change to the artifact layout.
pub const ARTIFACT_FORMAT_VERSION: &str = "l33-artifact-v1";

/// The identity tuple a distribution is derived from. Together with the
/// total amount this fixes the 32-byte distribution identifier.
#[derive(Debug, Clone)]
pub struct DistributionParams {
    pub reward_id: String,
    pub window_id: String,
    pub mint: Pubkey,
}

/// One recipient's committed payout and its inclusion proof.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProofEntry {
    pub index: u64,
    #[serde(with = "pubkey_hex")]
    pub recipient: Pubkey,
    #[serde(with = "u64_dec")]
    pub amount: u64,
    #[serde(with = "hex_nodes")]
    pub proof_nodes: Vec<[u8; 32]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionArtifact {
    pub format_version: String,
    /// Unix seconds at build time.
    pub created_at: u64,
    #[serde(with = "hex_32")]
    pub distribution_id: [u8; 32],
    #[serde(with = "hex_32")]
    pub merkle_root: [u8; 32],
    pub recipient_count: u64,
    #[serde(with = "u64_dec")]
    pub total_amount: u64,
    /// keccak of the canonical source input, for operator audit.
    #[serde(with = "hex_32")]
    pub source_fingerprint: [u8; 32],
    /// Ordered by `index`; a dense permutation of `[0, recipient_count)`.
    pub proofs: Vec<ProofEntry>,
}

impl DistributionArtifact {
    /// Build the artifact from validated payout entries.
    ///
    /// `source_input` is the payload as received (line-exact) and is only
    /// fingerprinted, never parsed here.
    pub fn new(
        params: &DistributionParams,
        entries: &[PayoutEntry],
        source_input: &[u8],
    ) -> Result<Self, MerkleTreeError> {
        let mut ordered = entries.to_vec();
        ordered.sort_by_key(|e| e.index);

        for (i, entry) in ordered.iter().enumerate() {
            if entry.index != i as u64 {
                return Err(MerkleTreeError::InvalidInput(format!(
                    "leaf indices are not dense at position {i} (found {})",
                    entry.index
                )));
            }
        }

        let total_amount = ordered
            .iter()
            .try_fold(0u64, |acc, e| acc.checked_add(e.amount))
            .ok_or(MerkleTreeError::Overflow)?;

        let distribution_id = derive_distribution_id(
            &params.reward_id,
            &params.window_id,
            &params.mint,
            total_amount,
        );

        let leaves: Vec<[u8; 32]> = ordered
            .iter()
            .map(|e| leaf_hash(&distribution_id, &e.recipient, e.amount))
            .collect();
        let tree = MerkleTree::new(&leaves)?;

        let proofs = ordered
            .iter()
            .map(|e| {
                Ok(ProofEntry {
                    index: e.index,
                    recipient: e.recipient,
                    amount: e.amount,
                    proof_nodes: tree.proof(e.index as usize)?,
                })
            })
            .collect::<Result<Vec<_>, MerkleTreeError>>()?;

        let artifact = Self {
            format_version: ARTIFACT_FORMAT_VERSION.to_string(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            distribution_id,
            merkle_root: tree.root(),
            recipient_count: ordered.len() as u64,
            total_amount,
            source_fingerprint: hashv(&[source_input]).to_bytes(),
            proofs,
        };

        artifact.validate()?;
        Ok(artifact)
    }

    /// Load a previously written artifact and re-check every invariant.
    pub fn new_from_file(path: &Path) -> Result<Self, MerkleTreeError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let artifact: DistributionArtifact = serde_json::from_reader(reader)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn write_to_file(&self, path: &Path) -> Result<(), MerkleTreeError> {
        let serialized = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(serialized.as_bytes())?;
        Ok(())
    }

    /// Check every artifact invariant, including folding each proof back
    /// to the committed root.
    pub fn validate(&self) -> Result<(), MerkleTreeError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(MerkleTreeError::ArtifactInvalid(format!(
                "unsupported format version {}",
                self.format_version
            )));
        }

        if self.proofs.len() as u64 != self.recipient_count {
            return Err(MerkleTreeError::ArtifactInvalid(format!(
                "proof count {} does not match recipient count {}",
                self.proofs.len(),
                self.recipient_count
            )));
        }

        let sum = self
            .proofs
            .iter()
            .try_fold(0u64, |acc, p| acc.checked_add(p.amount))
            .ok_or(MerkleTreeError::Overflow)?;
        if sum != self.total_amount {
            return Err(MerkleTreeError::ArtifactInvalid(format!(
                "proof amounts sum to {} but total_amount is {}",
                sum, self.total_amount
            )));
        }

        for (i, entry) in self.proofs.iter().enumerate() {
            if entry.index != i as u64 {
                return Err(MerkleTreeError::ArtifactInvalid(format!(
                    "proof indices are not a dense ordered permutation at {i}"
                )));
            }

            let leaf = leaf_hash(&self.distribution_id, &entry.recipient, entry.amount);
            if !verify(&entry.proof_nodes, self.merkle_root, leaf) {
                return Err(MerkleTreeError::ArtifactInvalid(format!(
                    "proof for index {} does not reach the committed root",
                    entry.index
                )));
            }
        }

        Ok(())
    }

    /// Look up one recipient's committed payout.
    pub fn proof_for(&self, recipient: &Pubkey) -> Option<&ProofEntry> {
        self.proofs.iter().find(|p| p.recipient == *recipient)
    }

    /// The leaf digest for one committed entry.
    pub fn leaf_for(&self, entry: &ProofEntry) -> [u8; 32] {
        leaf_hash(&self.distribution_id, &entry.recipient, entry.amount)
    }
}

mod hex_32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(d)?;
        let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected exactly 32 bytes of hex"))
    }
}

mod pubkey_hex {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_program::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(key.to_bytes()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Pubkey, D::Error> {
        let text = String::deserialize(d)?;
        let bytes: [u8; 32] = hex::decode(&text)
            .map_err(serde::de::Error::custom)?
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected exactly 32 bytes of hex"))?;
        Ok(Pubkey::new_from_array(bytes))
    }
}

mod hex_nodes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(nodes: &[[u8; 32]], s: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<String> = nodes.iter().map(hex::encode).collect();
        encoded.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<[u8; 32]>, D::Error> {
        let encoded = Vec::<String>::deserialize(d)?;
        encoded
            .into_iter()
            .map(|text| {
                let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
                bytes
                    .try_into()
                    .map_err(|_| serde::de::Error::custom("expected exactly 32 bytes of hex"))
            })
            .collect()
    }
}

mod u64_dec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let text = String::deserialize(d)?;
        text.parse::<u64>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DistributionParams {
        DistributionParams {
            reward_id: "rewards-q3".to_string(),
            window_id: "2024-07".to_string(),
            mint: Pubkey::new_unique(),
        }
    }

    fn entries(amounts: &[u64]) -> Vec<PayoutEntry> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| PayoutEntry {
                index: i as u64,
                recipient: Pubkey::new_unique(),
                amount: *amount,
            })
            .collect()
    }

    #[test]
    fn single_recipient_artifact() {
        let params = params();
        let entries = entries(&[1000]);
        let artifact = DistributionArtifact::new(&params, &entries, b"src").unwrap();

        assert_eq!(artifact.recipient_count, 1);
        assert_eq!(artifact.total_amount, 1000);
        // One leaf: the root is the leaf digest and the proof is empty.
        let entry = &artifact.proofs[0];
        assert!(entry.proof_nodes.is_empty());
        assert_eq!(artifact.merkle_root, artifact.leaf_for(entry));
    }

    #[test]
    fn three_recipient_artifact() {
        let params = params();
        let entries = entries(&[100, 200, 300]);
        let artifact = DistributionArtifact::new(&params, &entries, b"src").unwrap();

        assert_eq!(artifact.total_amount, 600);
        assert_eq!(artifact.recipient_count, 3);
        assert_eq!(artifact.proofs.len(), 3);
        // validate() already folded every proof back to the root.
        artifact.validate().unwrap();

        // The identifier is a function of the identity tuple and total.
        assert_eq!(
            artifact.distribution_id,
            derive_distribution_id("rewards-q3", "2024-07", &params.mint, 600)
        );
    }

    #[test]
    fn rejects_duplicate_index() {
        let params = params();
        let mut entries = entries(&[100, 200]);
        entries[1].index = 0;
        assert!(matches!(
            DistributionArtifact::new(&params, &entries, b"src"),
            Err(MerkleTreeError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_index_hole() {
        let params = params();
        let mut entries = entries(&[100, 200]);
        entries[1].index = 2;
        assert!(matches!(
            DistributionArtifact::new(&params, &entries, b"src"),
            Err(MerkleTreeError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_amount_overflow() {
        let params = params();
        let entries = entries(&[u64::MAX, 1]);
        assert!(matches!(
            DistributionArtifact::new(&params, &entries, b"src"),
            Err(MerkleTreeError::Overflow)
        ));
    }

    #[test]
    fn file_round_trip() {
        let params = params();
        let entries = entries(&[100, 200, 300]);
        let artifact = DistributionArtifact::new(&params, &entries, b"src").unwrap();

        let path = std::env::temp_dir().join("l33_artifact_roundtrip.json");
        artifact.write_to_file(&path).unwrap();
        let loaded = DistributionArtifact::new_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.distribution_id, artifact.distribution_id);
        assert_eq!(loaded.merkle_root, artifact.merkle_root);
        assert_eq!(loaded.total_amount, artifact.total_amount);
        assert_eq!(loaded.proofs, artifact.proofs);
    }

    #[test]
    fn tampered_proof_node_rejected() {
        let params = params();
        let entries = entries(&[100, 200, 300]);
        let mut artifact = DistributionArtifact::new(&params, &entries, b"src").unwrap();

        artifact.proofs[1].proof_nodes[0][4] ^= 0x01;
        assert!(matches!(
            artifact.validate(),
            Err(MerkleTreeError::ArtifactInvalid(_))
        ));
    }

    #[test]
    fn tampered_total_rejected() {
        let params = params();
        let entries = entries(&[100, 200, 300]);
        let mut artifact = DistributionArtifact::new(&params, &entries, b"src").unwrap();

        artifact.total_amount += 1;
        assert!(matches!(
            artifact.validate(),
            Err(MerkleTreeError::ArtifactInvalid(_))
        ));
    }

    #[test]
    fn tampered_amount_rejected() {
        let params = params();
        let entries = entries(&[100, 200, 300]);
        let mut artifact = DistributionArtifact::new(&params, &entries, b"src").unwrap();

        // Keep the sum intact but break one leaf.
        artifact.proofs[0].amount += 50;
        artifact.proofs[1].amount -= 50;
        assert!(matches!(
            artifact.validate(),
            Err(MerkleTreeError::ArtifactInvalid(_))
        ));
    }

    #[test]
    fn unsupported_version_rejected() {
        let params = params();
        let entries = entries(&[100]);
        let mut artifact = DistributionArtifact::new(&params, &entries, b"src").unwrap();

        artifact.format_version = "l33-artifact-v0".to_string();
        assert!(matches!(
            artifact.validate(),
            Err(MerkleTreeError::ArtifactInvalid(_))
        ));
    }

    #[test]
    fn source_fingerprint_tracks_input_bytes() {
        let params = params();
        let entries = entries(&[100]);
        let a = DistributionArtifact::new(&params, &entries, b"input-a").unwrap();
        let b = DistributionArtifact::new(&params, &entries, b"input-b").unwrap();
        assert_ne!(a.source_fingerprint, b.source_fingerprint);
    }

    #[test]
    fn proof_lookup_by_recipient() {
        let params = params();
        let entries = entries(&[100, 200]);
        let artifact = DistributionArtifact::new(&params, &entries, b"src").unwrap();

        let found = artifact.proof_for(&entries[1].recipient).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.amount, 200);
        assert!(artifact.proof_for(&Pubkey::new_unique()).is_none());
    }

    #[test]
    fn amounts_serialize_as_decimal_strings() {
        let params = params();
        let entries = entries(&[u64::MAX]);
        let artifact = DistributionArtifact::new(&params, &entries, b"src").unwrap();

        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains(&format!("\"{}\"", u64::MAX)));
        let parsed: DistributionArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.total_amount, u64::MAX);
    }
}
