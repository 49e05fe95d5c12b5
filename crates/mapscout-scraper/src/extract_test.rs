use super::*;

fn text(t: &str) -> ElementSnapshot {
    ElementSnapshot {
        text: t.to_string(),
        ..ElementSnapshot::default()
    }
}

fn labelled(label: &str) -> ElementSnapshot {
    ElementSnapshot {
        aria_label: Some(label.to_string()),
        ..ElementSnapshot::default()
    }
}

fn link(href: &str) -> ElementSnapshot {
    ElementSnapshot {
        href: Some(href.to_string()),
        ..ElementSnapshot::default()
    }
}

/// A detail view with every structural marker present.
fn full_page() -> DetailPage {
    DetailPage::new("Padaria Central\n4,6 (312)\nPadaria\nRua das Flores, 120 - Centro")
        .with_elements("h1", vec![text("Padaria Central")])
        .with_elements("button.DkEaL", vec![text("Padaria")])
        .with_elements(r#"[aria-label*="estrela"]"#, vec![labelled("4,6 estrelas")])
        .with_elements(r#"[aria-label*="avalia"]"#, vec![labelled("312 avaliações")])
        .with_elements(
            ADDRESS_SELECTOR,
            vec![labelled("Endereço: Rua das Flores, 120 - Centro, Caçapava - SP")],
        )
        .with_elements(PHONE_SELECTOR, vec![labelled("Telefone: (12) 3652-1234")])
        .with_elements(SITE_SELECTOR, vec![link("https://padariacentral.com.br/")])
}

#[test]
fn extracts_every_field_from_structured_markers() {
    let listing = extract_listing(&full_page());
    assert_eq!(listing.name, "Padaria Central");
    assert_eq!(listing.category, "Padaria");
    assert!((listing.stars - 4.6).abs() < 1e-9);
    assert_eq!(listing.reviews, 312);
    assert_eq!(listing.address, "Rua das Flores, 120 - Centro, Caçapava - SP");
    assert_eq!(listing.phone, "(12) 3652-1234");
    assert_eq!(listing.site, "https://padariacentral.com.br/");
}

#[test]
fn empty_page_yields_unknown_fields() {
    let listing = extract_listing(&DetailPage::default());
    assert_eq!(listing, ExtractedListing::default());
}

#[test]
fn name_skips_single_character_headings() {
    let page = DetailPage::new("")
        .with_elements("h1", vec![text(" "), text("X")])
        .with_elements("h1.DUwDvf", vec![text("Mercado Bom Preço")]);
    assert_eq!(extract_listing(&page).name, "Mercado Bom Preço");
}

#[test]
fn category_ignores_long_labels() {
    let long = "a".repeat(90);
    let page = DetailPage::new("")
        .with_elements("button.DkEaL", vec![text(&long)])
        .with_elements("span.mgr77e", vec![text("Cafeteria")]);
    assert_eq!(extract_listing(&page).category, "Cafeteria");
}

#[test]
fn rating_label_outside_range_is_skipped() {
    let page = DetailPage::new("")
        .with_elements(
            r#"[aria-label*="star"]"#,
            vec![labelled("0,0 stars"), labelled("4.2 stars")],
        );
    assert!((extract_listing(&page).stars - 4.2).abs() < 1e-9);
}

#[test]
fn rating_accepts_integer_label() {
    let page =
        DetailPage::new("").with_elements(r#"[aria-label*="estrela"]"#, vec![labelled("5 estrelas")]);
    assert!((extract_listing(&page).stars - 5.0).abs() < 1e-9);
}

#[test]
fn rating_falls_back_to_text_before_parenthesis() {
    let page = DetailPage::new("Padaria Central\n4,3 (1.204)\nPadaria");
    assert!((extract_listing(&page).stars - 4.3).abs() < 1e-9);
}

#[test]
fn rating_text_without_parenthesis_is_not_a_rating() {
    let page = DetailPage::new("Aberto até 4,3 km daqui");
    assert!(extract_listing(&page).stars.abs() < f64::EPSILON);
}

#[test]
fn reviews_label_handles_thousands_separators() {
    let page = DetailPage::new("")
        .with_elements(r#"[aria-label*="review"]"#, vec![labelled("1,234 reviews")]);
    assert_eq!(extract_listing(&page).reviews, 1234);
}

#[test]
fn reviews_fall_back_to_parenthesized_count() {
    let page = DetailPage::new("Padaria Central\n4,3 (1.204)\nPadaria");
    assert_eq!(extract_listing(&page).reviews, 1204);
}

#[test]
fn reviews_fall_back_to_count_before_word() {
    let page = DetailPage::new("Padaria Central\n87 avaliações\nPadaria");
    assert_eq!(extract_listing(&page).reviews, 87);
}

#[test]
fn zero_review_label_counts_as_missing() {
    let page = DetailPage::new("")
        .with_elements(r#"[aria-label*="avalia"]"#, vec![labelled("0 avaliações")]);
    assert_eq!(extract_listing(&page).reviews, 0);
}

#[test]
fn address_falls_back_to_street_pattern() {
    let page = DetailPage::new("Padaria\nAv. Brasil, 455 - Vila Antônio\nAberto");
    assert_eq!(extract_listing(&page).address, "Av. Brasil, 455 - Vila Antônio");
}

#[test]
fn address_field_without_label_uses_text() {
    let page = DetailPage::new("").with_elements(
        ADDRESS_SELECTOR,
        vec![ElementSnapshot {
            text: "Rua A, 1 - Centro".to_string(),
            aria_label: None,
            href: None,
        }],
    );
    assert_eq!(extract_listing(&page).address, "Rua A, 1 - Centro");
}

#[test]
fn english_prefixes_are_stripped() {
    let page = DetailPage::new("")
        .with_elements(ADDRESS_SELECTOR, vec![labelled("Address: 1 Main St, Springfield")])
        .with_elements(PHONE_SELECTOR, vec![labelled("Phone: +1 555-123-4567")]);
    let listing = extract_listing(&page);
    assert_eq!(listing.address, "1 Main St, Springfield");
    assert_eq!(listing.phone, "+1 555-123-4567");
}

#[test]
fn phone_falls_back_to_text_pattern() {
    let page = DetailPage::new("Ligue agora: +55 (11) 98888-7777 ou visite");
    assert_eq!(extract_listing(&page).phone, "+55 (11) 98888-7777");
}

#[test]
fn site_falls_back_to_first_external_link() {
    let page = DetailPage::new("").with_elements(
        EXTERNAL_LINK_SELECTOR,
        vec![
            link("https://www.google.com/maps/place/X"),
            link("https://lh5.googleusercontent.com/p/abc"),
            link("https://www.gstatic.com/icon.png"),
            link("https://padaria.example.org/contato"),
        ],
    );
    assert_eq!(extract_listing(&page).site, "https://padaria.example.org/contato");
}

#[test]
fn site_fallback_skips_map_share_links() {
    let page = DetailPage::new("").with_elements(
        EXTERNAL_LINK_SELECTOR,
        vec![
            link("https://maps.app.goo.gl/AbCdEf123"),
            link("https://goo.gl/maps/xyz"),
            link("https://padaria.example.org/contato"),
        ],
    );
    assert_eq!(extract_listing(&page).site, "https://padaria.example.org/contato");
}

#[test]
fn site_fallback_skips_configured_map_host() {
    let page = DetailPage::new("")
        .with_elements(
            EXTERNAL_LINK_SELECTOR,
            vec![
                link("https://mapas.interno.test/search/padaria"),
                link("https://cdn.mapas.interno.test/pin.png"),
                link("https://padaria.example.org/contato"),
            ],
        )
        .with_map_host("https://mapas.interno.test/maps");
    assert_eq!(extract_listing(&page).site, "https://padaria.example.org/contato");
}

#[test]
fn site_fallback_keeps_configured_host_lookalikes() {
    let page = DetailPage::new("")
        .with_elements(
            EXTERNAL_LINK_SELECTOR,
            vec![link("https://mapas.interno.test.example.org/")],
        )
        .with_map_host("https://mapas.interno.test/maps");
    assert_eq!(extract_listing(&page).site, "https://mapas.interno.test.example.org/");
}

#[test]
fn site_field_must_be_http() {
    let page = DetailPage::new("")
        .with_elements(SITE_SELECTOR, vec![link("javascript:void(0)")])
        .with_elements(EXTERNAL_LINK_SELECTOR, vec![link("https://loja.com.br")]);
    assert_eq!(extract_listing(&page).site, "https://loja.com.br");
}

#[test]
fn select_returns_empty_for_unknown_selector() {
    assert!(full_page().select("div.nope").is_empty());
}
