// Integration tests for path matching against a compiled manifest.

use pretty_assertions::assert_eq;
use rstest::rstest;
use trellis_router::segment::{build_tree, DirEntry};
use trellis_router::{CompiledManifest, MatchError, MatchOptions, MatchPolicy};

fn compile_with(entries: &[DirEntry], options: MatchOptions) -> CompiledManifest {
    let tree = build_tree(entries).expect("tree builds");
    CompiledManifest::compile(&tree, options).expect("manifest compiles")
}

fn compile(entries: &[DirEntry]) -> CompiledManifest {
    compile_with(entries, MatchOptions::default())
}

/// A small storefront hierarchy used across the matching tests.
fn storefront() -> CompiledManifest {
    compile(&[
        DirEntry::leaf("layout.rsx"),
        DirEntry::leaf("index.rsx"),
        DirEntry::leaf("about.rsx"),
        DirEntry::dir(
            "product",
            vec![
                DirEntry::leaf("featured.rsx"),
                DirEntry::leaf("[skuId].rsx"),
            ],
        ),
        DirEntry::dir("docs", vec![DirEntry::leaf("[...slug].rsx")]),
    ])
}

#[test]
fn root_index_matches_the_bare_path() {
    let manifest = storefront();
    let matched = manifest.match_path("/").unwrap();
    assert_eq!(matched.entry.pattern.display(), "/");
    assert!(matched.params.is_empty());
}

#[test]
fn static_route_is_never_shadowed_by_a_dynamic_sibling() {
    // `/product/featured` could be consumed by `[skuId]`; the static entry
    // must win by rank.
    let manifest = storefront();
    let matched = manifest.match_path("/product/featured").unwrap();
    assert_eq!(matched.entry.pattern.display(), "/product/featured");
    assert!(matched.params.is_empty());
}

#[test]
fn dynamic_param_binds_the_segment() {
    let manifest = storefront();
    let matched = manifest.match_path("/product/999").unwrap();
    assert_eq!(matched.entry.pattern.display(), "/product/:skuId");
    assert_eq!(matched.params.get_str("skuId"), Some("999"));
}

#[rstest]
#[case("/docs", "")]
#[case("/docs/guide", "guide")]
#[case("/docs/guide/intro/setup", "guide/intro/setup")]
fn rest_capture_reconstructs_the_trailing_path(#[case] path: &str, #[case] expected: &str) {
    let manifest = storefront();
    let matched = manifest.match_path(path).unwrap();
    assert_eq!(matched.entry.pattern.display(), "/docs/*slug");
    assert_eq!(matched.params.get_rest("slug").unwrap().join("/"), expected);
}

#[test]
fn no_match_is_a_recoverable_error() {
    let manifest = storefront();
    let err = manifest.match_path("/missing/deeply").unwrap_err();
    assert_eq!(
        err,
        MatchError::NotFound {
            path: "/missing/deeply".to_string()
        }
    );
    // The manifest is untouched; the caller picks a fallback and carries on.
    assert!(manifest.match_path("/about").is_ok());
}

#[rstest]
#[case("/about/")]
#[case("//about")]
#[case("/about//")]
fn normalization_makes_slash_noise_insignificant(#[case] path: &str) {
    let manifest = storefront();
    let matched = manifest.match_path(path).unwrap();
    assert_eq!(matched.entry.pattern.display(), "/about");
}

#[test]
fn matching_is_case_sensitive_by_default() {
    let manifest = storefront();
    assert!(manifest.match_path("/About").is_err());

    let relaxed = compile_with(
        &[DirEntry::leaf("about.rsx")],
        MatchOptions {
            case_insensitive: true,
            ..MatchOptions::default()
        },
    );
    assert!(relaxed.match_path("/About").is_ok());
}

#[test]
fn percent_encoded_segments_decode_before_matching() {
    let manifest = storefront();
    let matched = manifest.match_path("/product/sk%C3%BC-1").unwrap();
    assert_eq!(matched.params.get_str("skuId"), Some("skü-1"));
}

#[test]
fn pathless_group_contributes_no_url_token() {
    let manifest = compile(&[DirEntry::dir(
        "(account)",
        vec![
            DirEntry::dir("profile", vec![DirEntry::leaf("index.rsx")]),
            DirEntry::dir("settings", vec![DirEntry::leaf("index.rsx")]),
        ],
    )]);

    assert!(manifest.match_path("/profile").is_ok());
    assert!(manifest.match_path("/settings").is_ok());
    // The group name itself never appears in the URL space.
    assert!(manifest.match_path("/account/profile").is_err());
    assert!(manifest.match_path("/(account)/profile").is_err());
}

#[test]
fn static_route_wins_even_under_declaration_order() {
    // The rest sibling is declared first; the static entry must still
    // match, the policy only reorders dynamic and rest entries.
    let manifest = compile_with(
        &[
            DirEntry::leaf("[...slug].rsx"),
            DirEntry::leaf("about.rsx"),
        ],
        MatchOptions {
            policy: MatchPolicy::DeclarationOrder,
            ..MatchOptions::default()
        },
    );
    let matched = manifest.match_path("/about").unwrap();
    assert_eq!(matched.entry.pattern.display(), "/about");
    assert!(matched.params.is_empty());
}

#[test]
fn deeper_static_beats_shallow_rest() {
    let manifest = compile(&[
        DirEntry::dir("docs", vec![DirEntry::leaf("[...slug].rsx")]),
        DirEntry::dir(
            "docs-static",
            vec![DirEntry::leaf("index.rsx")],
        ),
    ]);
    let matched = manifest.match_path("/docs-static").unwrap();
    assert_eq!(matched.entry.pattern.display(), "/docs-static");
}

#[test]
fn matching_does_not_mutate_the_manifest() {
    let manifest = storefront();
    let before: Vec<String> = manifest
        .entries()
        .iter()
        .map(|e| e.pattern.display())
        .collect();
    let _ = manifest.match_path("/product/1");
    let _ = manifest.match_path("/nope");
    let after: Vec<String> = manifest
        .entries()
        .iter()
        .map(|e| e.pattern.display())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn params_preserve_pattern_order() {
    let manifest = compile(&[DirEntry::dir(
        "posts",
        vec![DirEntry::dir(
            "[year]",
            vec![DirEntry::leaf("[slug].rsx")],
        )],
    )]);
    let matched = manifest.match_path("/posts/2024/hello-world").unwrap();
    let names: Vec<&str> = matched.params.iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["year", "slug"]);
}

#[test]
fn url_generation_inverts_matching() {
    let manifest = storefront();
    let matched = manifest.match_path("/product/999").unwrap();
    assert_eq!(
        matched.entry.pattern.generate_url(&matched.params).unwrap(),
        "/product/999"
    );
}
