use std::sync::Arc;

use markdown_crossref_bib::Bibliography;
use markdown_crossref_engine::extensions::{
    Attributed, AttributionOptions, AttributionSource, CitationOptions, FigureOptions,
    ListOptions, TableOptions, attributions, cite, figures, tables,
};
use markdown_crossref_engine::token::invariants;
use markdown_crossref_engine::{Markdown, RenderEnv, TokenKind};
use pretty_assertions::assert_eq;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).unwrap()
}

fn crossref() -> Markdown {
    let mut md = Markdown::new();
    figures::add(&mut md, FigureOptions::default()).unwrap();
    tables::add(&mut md, TableOptions::default()).unwrap();
    cite::add(
        &mut md,
        CitationOptions {
            sources: vec![fixture_path("example.bib").into()],
            list: ListOptions::default(),
        },
    )
    .unwrap();
    md
}

fn assert_fixture(name: &str) {
    let md = crossref();
    let html = md.render(&fixture(&format!("{name}.md")));
    assert_eq!(html, fixture(&format!("{name}.html")));
}

#[test]
fn fixture_single_figure() {
    assert_fixture("figure");
}

#[test]
fn fixture_multiple_tables() {
    assert_fixture("tables");
}

#[test]
fn fixture_reused_citation() {
    assert_fixture("citations");
}

#[test]
fn explicit_id_round_trip() {
    let html = crossref().render("![n](n.png \"Name#custom-id\")\n\n<<fig:custom-id>>\n");
    assert!(html.contains("<figure id=\"custom-id\">"));
    assert!(html.contains("title=\"Name\""));
    assert!(html.contains("<a href=\"#custom-id\">Figure 1</a>: Name</li>"));
    assert!(html.contains("<a href=\"#custom-id\" class=\"figure-citation\">Figure 1</a>"));
}

#[test]
fn dangling_references_render_literally() {
    let html = crossref().render("See <<fig:missing>> and <<tab:missing>>.\n");
    assert_eq!(
        html,
        "<p>See &lt;&lt;fig:missing&gt;&gt; and &lt;&lt;tab:missing&gt;&gt;.</p>\n"
    );
}

#[test]
fn suppressed_lists_keep_numbering() {
    let no_list = ListOptions {
        enable: false,
        ..ListOptions::default()
    };
    let mut md = Markdown::new();
    figures::add(
        &mut md,
        FigureOptions {
            list: no_list.clone(),
            ..FigureOptions::default()
        },
    )
    .unwrap();
    tables::add(
        &mut md,
        TableOptions {
            list: no_list,
            ..TableOptions::default()
        },
    )
    .unwrap();

    let html = md.render("![a](a.png \"A\")\n\n![b](b.png \"B\")\n\n<<fig:b>>\n");
    assert!(!html.contains("<hr"));
    assert!(!html.contains("<h2"));
    assert!(!html.contains("<ul"));
    assert!(html.contains("<span class=\"label\">Figure 2</span>: B"));
    assert!(html.ends_with("<p><a href=\"#b\" class=\"figure-citation\">Figure 2</a></p>\n"));
}

#[test]
fn numbering_follows_first_appearance() {
    let html = crossref().render(
        "| x |\n|---|\n\n.Second table#t2\n\n![a](a.png \"First figure#f1\")\n\n\
         | y |\n|---|\n\n.Third table#t3\n\n<<tab:t3>> <<tab:t2>> <<fig:f1>>\n",
    );
    assert!(html.contains(
        "<a href=\"#t3\" class=\"table-citation\">Table 2</a> \
         <a href=\"#t2\" class=\"table-citation\">Table 1</a> \
         <a href=\"#f1\" class=\"figure-citation\">Figure 1</a>"
    ));
}

#[test]
fn rendering_twice_is_identical() {
    let md = crossref();
    let src = fixture("tables.md");
    assert_eq!(md.render(&src), md.render(&src));
}

#[test]
fn citations_inside_captions() {
    let html = crossref().render("![TeX](tex.png \"Typeset with @knuth84\")\n");
    assert!(html.contains(
        "Figure 1</span>: Typeset with <a href=\"#citation-1\" class=\"citation\">1</a></figcaption>"
    ));
    assert!(html.contains("<li id=\"citation-1\">[1]: "));
}

#[test]
fn caption_citations_are_numbered_after_body_citations() {
    let html = crossref().render("![TeX](tex.png \"Typeset with @knuth84\")\n\nSee @lamport94.\n");
    assert!(html.contains("Typeset with <a href=\"#citation-2\" class=\"citation\">2</a>"));
    assert!(html.contains("See <a href=\"#citation-1\" class=\"citation\">1</a>."));
}

#[test]
fn attributed_passages_after_other_lists() {
    let mut md = crossref();
    attributions::add(
        &mut md,
        AttributionOptions {
            sources: vec![AttributionSource {
                key: "gb".to_string(),
                title: Some(Attributed::Text("Moby Dick".to_string())),
                author: Some(Attributed::Text("Herman Melville".to_string())),
                license: None,
            }],
            ..AttributionOptions::default()
        },
    )
    .unwrap();
    let html = md.render("![a](a.png \"A\")\n\n> Call me Ishmael.\n>\n> [@gb]\n");
    let figures = html.find("id=\"list-of-figures\"").unwrap();
    let attributions = html.find("id=\"list-of-attributions\"").unwrap();
    assert!(figures < attributions);
    assert!(html.contains("<p><a href=\"#gb__1\" class=\"anchor\">§</a>[<a href=\"#gb\" class=\"label\">1</a>]</p>"));
    assert!(html.ends_with(
        "<li id=\"gb\" class=\"item\"><span class=\"label\">[1]</span>: Moby Dick (By: Herman Melville)</li>\n</ol>\n"
    ));
}

#[test]
fn all_lists_in_installation_order() {
    let html = crossref().render(
        "![a](a.png \"A\")\n\n| x |\n|---|\n\n.T\n\nCited @charness.\n",
    );
    let figures = html.find("id=\"list-of-figures\"").unwrap();
    let tables = html.find("id=\"list-of-tables\"").unwrap();
    let bibliography = html.find("id=\"bibliography\"").unwrap();
    assert!(figures < tables && tables < bibliography);
    assert!(html.contains(
        "[1]: <a href=\"https://ebooks.iospress.nl/volumearticle/16948\">Ergonomics and Ageing: \
         The Role of Interactions</a> (Neil Charness, ISBN: 978-90-5199-367-7, DOI: \
         <a href=\"https://doi.org/10.3233/978-1-60750-892-2-62\">10.3233/978-1-60750-892-2-62</a>)"
    ));
}

#[test]
fn toml_frontmatter_overrides_labels() {
    let html = crossref().render(
        "+++\n[list-of-figures]\nlabel = \"Abbildung\"\ntitle = \"Abbildungsverzeichnis\"\n+++\n\n\
         ![a](a.png \"Katze\")\n",
    );
    assert!(html.contains("<span class=\"label\">Abbildung 1</span>: Katze"));
    assert!(html.contains("<h2 id=\"list-of-figures\">Abbildungsverzeichnis</h2>"));
}

#[test]
fn level_invariants_hold_after_rewriting() {
    let md = crossref();
    let mut env = RenderEnv::new();
    let src = "> ![q](q.png \"Quoted\")\n\n- item\n\n  | a |\n  |---|\n\n  .In a list\n\n\
               <table>\n<tr><td>1</td></tr>\n</table>\n\n.Raw\n\n@lamport94\n";
    let tokens = md.parse(src, &mut env);
    assert_eq!(invariants::check(&tokens), Ok(()));
    assert_eq!(env.figures.len(), 1);
    assert_eq!(env.tables.len(), 2);
    assert_eq!(env.citations.len(), 1);
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Figure));
}

#[test]
fn shared_between_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Markdown>();

    let md = Arc::new(crossref());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let md = Arc::clone(&md);
            std::thread::spawn(move || md.render(&format!("![x](x.png \"Figure {n}\")\n")))
        })
        .collect();
    for handle in handles {
        let html = handle.join().unwrap();
        assert!(html.contains("<span class=\"label\">Figure 1</span>"));
    }
}

#[test]
fn preloaded_bibliography() {
    let bibliography = Bibliography::parse("@misc{only, title = {Only One}}").unwrap();
    let mut md = Markdown::new();
    cite::add_with_bibliography(&mut md, CitationOptions::default(), Arc::new(bibliography))
        .unwrap();
    assert_eq!(
        md.render("@only\n"),
        "<p><a href=\"#citation-1\" class=\"citation\">1</a></p>\n\
         <hr class=\"bibliography\" />\n\
         <h2 id=\"bibliography\">Bibliography</h2>\n\
         <ul class=\"bibliography\">\n\
         <li id=\"citation-1\">[1]: Only One</li>\n\
         </ul>\n"
    );
}
