//! Performance benchmarks for rs-social-extract.
//!
//! Run with: `cargo bench`
//!
//! Benchmarks include:
//! - Single tweet, TikTok video and Instagram post snapshots
//! - Tweet threads of growing length (reply extraction dominates)
//! - A generic article read through Readability

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rs_social_extract::{extract_document, Options};

const TWEET: &str = r#"<html><body><main><div data-testid="primaryColumn">
<article data-testid="tweet">
  <div data-testid="User-Name">
    <a href="/jack" tabindex="-1"><span>Jack</span></a>
    <a href="/jack" tabindex="-1"><span>@jack</span></a>
    <a href="/jack/status/20"><time datetime="2006-03-21T20:50:14.000Z">Mar 21, 2006</time></a>
  </div>
  <div data-testid="tweetText" lang="en">just setting up my twttr #firsts with @biz</div>
  <div role="group">
    <button data-testid="reply"><span>1.2K</span></button>
    <button data-testid="retweet"><span>120K</span></button>
    <button data-testid="like"><span>300K</span></button>
  </div>
</article>
REPLIES
</div></main></body></html>"#;

const TIKTOK: &str = r#"<html><body><div id="app"><div class="css-1q DivVideoDetailContainer">
  <div data-e2e="browse-video"><video src="https://v16-webapp.tiktok.com/play/7301.mp4" poster="https://p16.tiktokcdn.com/c.jpg"></video></div>
  <a data-e2e="video-author-avatar" href="/@chef.mia">avatar</a>
  <span data-e2e="browse-username">chef.mia</span>
  <span data-e2e="browser-nickname"><span>Mia Cooks</span><span> · </span><span>2d ago</span></span>
  <h1 data-e2e="browse-video-desc"><span>Crispy tofu in 10 minutes</span> <a href="/tag/cooking"><strong>#cooking</strong></a></h1>
  <h4 data-e2e="browse-music"><a href="/music/original-sound-123">original sound - Mia Cooks</a></h4>
  <strong data-e2e="like-count">12.5K</strong>
  <strong data-e2e="comment-count">321</strong>
  <strong data-e2e="share-count">88</strong>
</div></div></body></html>"#;

const INSTAGRAM: &str = r#"<html><body><main><article>
  <header><a href="/harbour.cafe/"><span>harbour.cafe</span></a></header>
  <div class="_aagv"><img src="https://scontent.cdninstagram.com/v/t51/sunrise.jpg" alt="Sunrise over the pier"></div>
  <ul><li><h1>Sunrise over the pier this morning #harbour #coffee with @dockside.bakery</h1></li></ul>
  <section><a href="/p/C4xYz12AbCd/liked_by/"><span>1,204</span> likes</a></section>
  <a href="/p/C4xYz12AbCd/"><time datetime="2024-03-05T07:10:00.000Z">March 5</time></a>
</article></main></body></html>"#;

const PARAGRAPH: &str = "Harbour officials said the new breakwater, finished two months ahead of schedule, \
    has already reduced the swell inside the marina during the last three winter storms. Fishing crews that \
    used to wait out rough weather at the northern pier now stay moored in the inner basin.";

fn thread(replies: usize) -> String {
    let entries: String = (0..replies)
        .map(|i| {
            format!(
                r#"<article data-testid="tweet">
  <div data-testid="User-Name"><a href="/user{i}" tabindex="-1"><span>@user{i}</span></a>
    <a href="/user{i}/status/{id}"><time datetime="2006-03-22T10:00:00.000Z">Mar 22</time></a></div>
  <div data-testid="tweetText" lang="en">reply number {i} to the first tweet</div>
</article>"#,
                id = 1000 + i
            )
        })
        .collect();
    TWEET.replace("REPLIES", &entries)
}

fn article() -> String {
    format!(
        r#"<html><head><title>Breakwater finished early</title>
        <meta property="article:published_time" content="2024-03-05T14:30:00Z"></head>
        <body><nav><a href="/">Home</a></nav><article><h1>Breakwater finished early</h1>
        <p class="byline">By <a rel="author" href="/staff/dana">Dana Reyes</a></p>
        <p>{PARAGRAPH}</p><p>{PARAGRAPH}</p><p>{PARAGRAPH}</p><p>{PARAGRAPH}</p></article>
        <footer>Copyright Coastal Times</footer></body></html>"#
    )
}

fn bench_platform_snapshots(c: &mut Criterion) {
    let options = Options::offline();
    let tweet = thread(0);
    let pages = [
        ("twitter", "https://x.com/jack/status/20", tweet.as_str()),
        ("tiktok", "https://www.tiktok.com/@chef.mia/video/7301", TIKTOK),
        ("instagram", "https://www.instagram.com/p/C4xYz12AbCd/", INSTAGRAM),
    ];

    let mut group = c.benchmark_group("snapshot");
    for (name, url, html) in pages {
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::new("extract", name), &html, |b, html| {
            b.iter(|| extract_document(black_box(url), black_box(html), &options));
        });
    }
    group.finish();
}

fn bench_thread_length(c: &mut Criterion) {
    let options = Options::offline();
    let mut group = c.benchmark_group("thread");
    for replies in [10, 50, 200] {
        let html = thread(replies);
        group.throughput(Throughput::Elements(replies as u64));
        group.bench_with_input(BenchmarkId::from_parameter(replies), &html, |b, html| {
            b.iter(|| extract_document(black_box("https://x.com/jack/status/20"), black_box(html), &options));
        });
    }
    group.finish();
}

fn bench_generic_article(c: &mut Criterion) {
    let options = Options::offline();
    let html = article();
    c.bench_function("generic_article", |b| {
        b.iter(|| extract_document(black_box("https://news.example.org/2024/03/breakwater"), black_box(&html), &options));
    });
}

criterion_group!(benches, bench_platform_snapshots, bench_thread_length, bench_generic_article);
criterion_main!(benches);
