use rs_social_extract::{extract_document, Error, MemoryPage, Options, StrategyDispatcher};

const URLS: [&str; 4] = [
    "https://x.com/jack/status/20",
    "https://www.tiktok.com/@chef.mia/video/7301",
    "https://www.instagram.com/p/C4abc/",
    "https://news.example.org/a",
];

const DOCUMENTS: [&str; 8] = [
    "",
    "<p>text<div>more",
    "<p><div></p></div>",
    r#"<article data-testid="tweet"><div data-testid="tweetText">"#,
    r#"<script id="__UNIVERSAL_DATA_FOR_REHYDRATION__" type="application/json">{"__DEFAULT_SCOPE__": </script>"#,
    r#"<script type="application/ld+json">[[[{"@type": "VideoObject"</script><main><article>x</article></main>"#,
    "<html><body>\u{0}\u{200b}\u{feff}</body></html>",
    r#"<main role="main"><article><header><a href="/">/</a></header><time datetime="not-a-date">?</time></article></main>"#,
];

#[test]
fn malformed_documents_never_panic() {
    for url in URLS {
        for html in DOCUMENTS {
            match extract_document(url, html, &Options::offline()) {
                Ok(content) => assert!((0.0..=1.0).contains(&content.metadata.confidence)),
                Err(Error::NoContentRoot) => {}
                Err(err) => panic!("{url} {html:?}: unexpected {err:?}"),
            }
        }
    }
}

#[test]
fn broken_embedded_data_falls_back_to_dom() {
    let html = r#"<html><body>
        <script id="__UNIVERSAL_DATA_FOR_REHYDRATION__" type="application/json">{"__DEFAULT_SCOPE__": {</script>
        <div class="DivVideoDetailContainer">
          <span data-e2e="browse-username">chef.mia</span>
          <h1 data-e2e="browse-video-desc">Crispy tofu in 10 minutes</h1>
        </div></body></html>"#;
    let video = extract_document("https://www.tiktok.com/@chef.mia/video/7301", html, &Options::offline()).unwrap();

    assert_eq!(video.text, "Crispy tofu in 10 minutes");
    assert!(video.metadata.errors.iter().any(|e| e.contains("embedded")));
}

#[tokio::test]
async fn dispatcher_survives_every_document() {
    let dispatcher = StrategyDispatcher::new(&Options::offline());
    for url in URLS {
        for html in DOCUMENTS {
            let host = MemoryPage::new(url, html);
            let out = dispatcher.dispatch(&host).await;
            assert_eq!(out.is_placeholder(), out.content.metadata.failure.is_some());
            dispatcher.cleanup();
        }
    }
}
