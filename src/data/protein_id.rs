//! UniProt FASTA header helpers
//!
//! Headers look like `sp|P12345|NAME_HUMAN`; quant tables may join several
//! with `;`.

/// Accession between the first two pipes; bare identifiers pass through
pub fn accession(header: &str) -> String {
    let header = header.trim();
    let mut parts = header.split('|');
    match (parts.next(), parts.next()) {
        (Some(_), Some(acc)) if !acc.trim().is_empty() => acc.trim().to_string(),
        _ => header.to_string(),
    }
}

/// Entry name after the second pipe (`NAME_HUMAN`); bare identifiers pass through
pub fn entry_name(header: &str) -> String {
    let header = header.trim();
    match header.splitn(3, '|').nth(2) {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => header.to_string(),
    }
}

/// Gene-like short label: last pipe field, cut at the first underscore
pub fn short_name(header: &str) -> String {
    let last = header.trim().rsplit('|').next().unwrap_or_default();
    last.split('_').next().unwrap_or_default().to_string()
}

/// Accessions of every header in a `;`-joined group
pub fn accessions(group: &str) -> Vec<String> {
    group
        .split(';')
        .filter(|h| !h.trim().is_empty())
        .map(accession)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accession() {
        assert_eq!(accession("sp|P12345|NAME_HUMAN"), "P12345");
        assert_eq!(accession(" P12345 "), "P12345");
        assert_eq!(accession("tr|A0A024R161|A0A024R161_HUMAN"), "A0A024R161");
    }

    #[test]
    fn test_entry_and_short_name() {
        assert_eq!(entry_name("sp|P04637|P53_HUMAN"), "P53_HUMAN");
        assert_eq!(entry_name("P53_HUMAN"), "P53_HUMAN");
        assert_eq!(short_name("sp|P04637|P53_HUMAN"), "P53");
        assert_eq!(short_name("MYC"), "MYC");
    }

    #[test]
    fn test_grouped_accessions() {
        assert_eq!(
            accessions("sp|P1|A_HUMAN;sp|P2|B_HUMAN;"),
            vec!["P1".to_string(), "P2".to_string()]
        );
    }
}
