//! Domain blacklist used by stage 2 to filter SERP rows before they ever
//! reach the discovery chooser. Ground truth:
//! `app/services/discovery/discovery_service.py::BLACKLIST_DOMAINS` /
//! `is_blacklisted_domain`.

const BLACKLIST_DOMAINS: &[&str] = &[
    // Business-data aggregators
    "econodata.com.br",
    "cnpj.biz",
    "cnpja.com",
    "cnpj.info",
    "cnpjs.rocks",
    "casadosdados.com.br",
    "empresascnpj.com",
    "consultacnpj.com",
    "informecadastral.com.br",
    "cadastroempresa.com.br",
    "transparencia.cc",
    "listamais.com.br",
    "solutudo.com.br",
    "telelistas.net",
    "apontador.com.br",
    "guiamais.com.br",
    "construtora.net.br",
    "b2bleads.com.br",
    "empresas.serasaexperian.com.br",
    "jusbrasil.com.br",
    "jusdados.com",
    // Social networks
    "facebook.com",
    "instagram.com",
    "linkedin.com",
    "youtube.com",
    "twitter.com",
    "x.com",
    "tiktok.com",
    "pinterest.com",
    "threads.net",
    // Marketplaces
    "mercadolivre.com.br",
    "shopee.com.br",
    "olx.com.br",
    "amazon.com.br",
    "magazineluiza.com.br",
    "americanas.com.br",
    // Search-cache URLs
    "translate.google.com",
    "webcache.googleusercontent.com",
];

/// True iff `link`'s host is a blacklisted domain or a subdomain of one.
pub fn is_blacklisted(link: &str) -> bool {
    let Some(host) = extract_host(link) else { return false };
    BLACKLIST_DOMAINS
        .iter()
        .any(|blacklisted| host == *blacklisted || host.ends_with(&format!(".{blacklisted}")))
}

fn extract_host(link: &str) -> Option<String> {
    let with_scheme =
        if link.starts_with("http://") || link.starts_with("https://") { link.to_string() } else { format!("https://{link}") };
    let parsed = url::Url::parse(&with_scheme).ok()?;
    let mut host = parsed.host_str()?.to_lowercase();
    for prefix in ["www.", "m.", "mobile."] {
        if let Some(stripped) = host.strip_prefix(prefix) {
            host = stripped.to_string();
        }
    }
    Some(host)
}

/// Filters and deduplicates (by URL) a set of SERP rows, per spec §4.4
/// step 2.
pub fn filter_and_dedupe(rows: &[crate::models::SerpRow]) -> Vec<crate::models::SerpRow> {
    let mut seen = std::collections::HashSet::new();
    rows.iter()
        .filter(|row| !is_blacklisted(&row.link))
        .filter(|row| seen.insert(row.link.clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SerpRow;

    #[test]
    fn blacklists_exact_and_subdomain_matches() {
        assert!(is_blacklisted("https://www.facebook.com/empresa"));
        assert!(is_blacklisted("https://m.facebook.com/empresa"));
        assert!(is_blacklisted("https://sub.jusbrasil.com.br/x"));
        assert!(!is_blacklisted("https://empresa.com.br"));
    }

    #[test]
    fn dedupes_by_url_after_filtering() {
        let rows = vec![
            SerpRow { title: "a".into(), link: "https://empresa.com.br".into(), snippet: "".into() },
            SerpRow { title: "b".into(), link: "https://facebook.com/empresa".into(), snippet: "".into() },
            SerpRow { title: "c".into(), link: "https://empresa.com.br".into(), snippet: "".into() },
        ];
        let filtered = filter_and_dedupe(&rows);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].link, "https://empresa.com.br");
    }
}
