use rs_social_extract::confidence::{score, ConfidenceSignals};
use rs_social_extract::options::ConfidenceWeights;
use rs_social_extract::result::{Provenance, TimestampSource};
use rs_social_extract::{extract_document, ContentKind, Error, KindDetails, Options, Platform};

const CONVERSATION: &str = r#"<html><body><main role="main"><div data-testid="primaryColumn">
  <div data-testid="cellInnerDiv"><article data-testid="tweet" role="article">
    <div data-testid="User-Name">
      <div><a href="/jack" role="link"><span>Jack</span></a></div>
      <div><a href="/jack" role="link" tabindex="-1"><span>@jack</span></a>
           <a href="/jack/status/20" role="link"><time datetime="2006-03-21T20:50:14.000Z">Mar 21, 2006</time></a></div>
    </div>
    <div data-testid="tweetText" lang="en" dir="auto">just setting up my twttr #firsttweet with <a href="/biz">@biz</a></div>
    <div role="group">
      <div data-testid="reply" aria-label="12,345 Replies. Reply"></div>
      <div data-testid="like" aria-label="301,234 Likes. Like"></div>
    </div>
  </article></div>
  <div data-testid="cellInnerDiv"><article data-testid="tweet" role="article">
    <div data-testid="User-Name">
      <div><a href="/biz" role="link"><span>Biz Stone</span></a></div>
      <div><a href="/biz" role="link" tabindex="-1"><span>@biz</span></a>
           <a href="/biz/status/21" role="link"><time datetime="2006-03-21T21:00:00.000Z">Mar 21, 2006</time></a></div>
    </div>
    <div data-testid="tweetText" lang="en" dir="auto">welcome!</div>
  </article></div>
  <div data-testid="cellInnerDiv"><article data-testid="tweet" role="article">
    <div data-testid="User-Name">
      <div><a href="/ev" role="link"><span>Ev</span></a></div>
      <div><a href="/ev" role="link" tabindex="-1"><span>@ev</span></a>
           <a href="/ev/status/22" role="link"><time datetime="2006-03-21T21:05:00.000Z">Mar 21, 2006</time></a></div>
    </div>
    <div data-testid="tweetText" lang="en" dir="auto">me too</div>
  </article></div>
</div></main></body></html>"#;

const TIKTOK_VIDEO: &str = r#"<html><body><div id="app"><div class="css-1q DivVideoDetailContainer">
  <div data-e2e="browse-video"><video src="https://v16-webapp.tiktok.com/play/7301.mp4" poster="https://p16.tiktokcdn.com/c.jpg"></video></div>
  <a data-e2e="video-author-avatar" href="/@chef.mia">avatar</a>
  <span data-e2e="browse-username">chef.mia</span>
  <span data-e2e="browser-nickname"><span>Mia Cooks</span></span>
  <h1 data-e2e="browse-video-desc"><span>Crispy tofu in 10 minutes</span> <a href="/tag/cooking"><strong>#cooking</strong></a></h1>
  <h4 data-e2e="browse-music"><a href="/music/original-sound-123">original sound - Mia Cooks</a></h4>
  <strong data-e2e="like-count">12.5K</strong>
  <strong data-e2e="comment-count">321</strong>
</div></div></body></html>"#;

const INSTAGRAM_POST: &str = r#"<html><body><main role="main"><article>
  <header>
    <a href="/natgeo" role="link"><span dir="auto">natgeo</span></a>
    <a href="/explore/locations/213/lisbon-portugal/">Lisbon, Portugal</a>
  </header>
  <div role="presentation"><ul>
    <li><div class="_aagv"><img src="https://scontent.cdninstagram.com/a_1080.jpg" alt="Photo by natgeo"></div></li>
  </ul></div>
  <section><a href="/p/C4abc/liked_by/"><span>51,234</span> likes</a></section>
  <a href="/p/C4abc/"><time datetime="2024-03-05T14:30:00.000Z">March 5</time></a>
  <ul class="_a9z6">
    <li><h1 dir="auto">Lisbon light <a href="/explore/tags/travel/">#travel</a></h1></li>
    <ul class="_a9ym"><li>
      <h3><a href="/fan.one">fan.one</a></h3><span dir="auto">stunning colours</span>
    </li></ul>
  </ul>
</article></main></body></html>"#;

fn offline() -> Options {
    Options::offline()
}

#[test]
fn tweet_page_yields_focal_tweet_with_thread_entries() {
    let tweet = extract_document("https://x.com/jack/status/20", CONVERSATION, &offline()).unwrap();

    assert_eq!(tweet.platform, Platform::Twitter);
    assert_eq!(tweet.id, "20");
    assert_eq!(tweet.author.handle.as_deref(), Some("jack"));
    assert_eq!(tweet.author.display_name.as_deref(), Some("Jack"));
    assert!(tweet.text.starts_with("just setting up my twttr"));
    assert_eq!(tweet.engagement.likes, Some(301_234));
    assert_eq!(tweet.engagement.comments, Some(12_345));
    assert_eq!(tweet.hashtags, vec!["firsttweet"]);
    assert_eq!(tweet.mentions, vec!["biz"]);
    assert_eq!(tweet.metadata.timestamp_source, Some(TimestampSource::Machine));
    assert_eq!(tweet.metadata.provenance, Provenance::Dom);

    let ids: Vec<&str> = tweet.replies.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["21", "22"]);
    for (position, reply) in tweet.replies.iter().enumerate() {
        assert_eq!(
            reply.details,
            KindDetails::ThreadEntry {
                position,
                root_id: "20".to_string()
            }
        );
        assert!(reply.metadata.confidence > 0.0);
    }
}

#[test]
fn reply_page_picks_the_tweet_named_in_the_url() {
    let tweet = extract_document("https://twitter.com/biz/status/21", CONVERSATION, &offline()).unwrap();
    assert_eq!(tweet.id, "21");
    assert_eq!(tweet.text, "welcome!");
    let ids: Vec<&str> = tweet.replies.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["20", "22"]);
}

#[test]
fn replies_are_capped() {
    let options = Options {
        max_replies: 1,
        ..offline()
    };
    let tweet = extract_document("https://x.com/jack/status/20", CONVERSATION, &options).unwrap();
    assert_eq!(tweet.replies.len(), 1);
    assert_eq!(tweet.replies[0].id, "21");
}

#[test]
fn hookless_markup_falls_back_to_later_selectors() {
    let html = r#"<html><body><main role="main">
        <article role="article">
          <a role="link" href="/dorsey">Jack Dorsey</a>
          <a href="/dorsey/status/99"><time datetime="2024-01-02T03:04:05.000Z">Jan 2</time></a>
          <div lang="en" dir="auto">markup without test ids still reads</div>
        </article></main></body></html>"#;
    let tweet = extract_document("https://x.com/dorsey/status/99", html, &offline()).unwrap();

    assert_eq!(tweet.platform, Platform::Twitter);
    assert_eq!(tweet.id, "99");
    assert_eq!(tweet.text, "markup without test ids still reads");
    assert_eq!(tweet.author.handle.as_deref(), Some("dorsey"));
    assert!(tweet
        .metadata
        .selectors_used
        .iter()
        .any(|s| s.contains(r#"div[lang][dir="auto"]"#)));
    assert!(!tweet.metadata.selectors_used.iter().any(|s| s.contains("tweetText")));
}

#[test]
fn tiktok_video_page_reads_dom_fields() {
    let video = extract_document("https://www.tiktok.com/@chef.mia/video/7301", TIKTOK_VIDEO, &offline()).unwrap();

    assert_eq!(video.platform, Platform::TikTok);
    assert_eq!(video.kind(), ContentKind::Video);
    assert_eq!(video.id, "7301");
    assert_eq!(video.author.handle.as_deref(), Some("chef.mia"));
    assert_eq!(video.engagement.likes, Some(12_500));
    assert_eq!(video.engagement.comments, Some(321));
    assert_eq!(video.hashtags, vec!["cooking"]);
    let music = video.details.music().unwrap();
    assert_eq!(music.title, "original sound");
    assert_eq!(music.artist.as_deref(), Some("Mia Cooks"));
}

#[test]
fn instagram_post_page_reads_post_and_comments() {
    let post = extract_document("https://www.instagram.com/p/C4abc/", INSTAGRAM_POST, &offline()).unwrap();

    assert_eq!(post.platform, Platform::Instagram);
    assert_eq!(post.kind(), ContentKind::Post);
    assert_eq!(post.id, "C4abc");
    assert_eq!(post.author.handle.as_deref(), Some("natgeo"));
    assert_eq!(post.engagement.likes, Some(51_234));
    assert_eq!(post.timestamp.map(|t| t.timestamp()), Some(1_709_649_000));
    assert_eq!(post.replies.len(), 1);
    assert_eq!(post.replies[0].kind(), ContentKind::Comment);
    assert_eq!(post.replies[0].text, "stunning colours");
}

#[test]
fn unknown_site_is_read_as_article() {
    let html = "<html><head><title>Release notes</title></head><body><nav>Home</nav>\
        <article><h1>Release notes</h1><p>Version two adds offline support and a faster importer.</p></article>\
        </body></html>";
    let article = extract_document("https://blog.example.com/release-notes", html, &offline()).unwrap();

    assert_eq!(article.platform, Platform::Generic);
    assert_eq!(article.kind(), ContentKind::Article);
    assert!(article.text.contains("offline support"));
}

#[test]
fn platform_url_without_platform_markup_is_generic() {
    let html = "<html><body><article><p>Terms of service for the website.</p></article></body></html>";
    let page = extract_document("https://www.tiktok.com/legal/terms", html, &offline()).unwrap();
    assert_eq!(page.platform, Platform::Generic);
}

#[test]
fn invalid_url_is_rejected() {
    let err = extract_document("not a url", CONVERSATION, &offline()).unwrap_err();
    assert!(matches!(err, Error::Host(_)));
}

#[test]
fn empty_platform_page_has_no_content_root() {
    let html = r#"<html><body><div data-testid="primaryColumn"></div></body></html>"#;
    let err = extract_document("https://x.com/jack/status/20", html, &offline()).unwrap_err();
    assert_eq!(err, Error::NoContentRoot);
}

#[test]
fn confidence_grows_with_each_field() {
    let weights = ConfidenceWeights::default();
    let mut signals = ConfidenceSignals::default();
    let mut last = score(&signals, &weights);
    assert_eq!(last, 0.0);

    let steps: [fn(&mut ConfidenceSignals); 6] = [
        |s| s.text_chars = 120,
        |s| s.has_handle = true,
        |s| s.has_display_name = true,
        |s| s.timestamp = Some(TimestampSource::Relative),
        |s| s.engagement_fields = 2,
        |s| s.media_count = 1,
    ];
    for step in steps {
        step(&mut signals);
        let next = score(&signals, &weights);
        assert!(next >= last, "{next} < {last}");
        assert!(next <= 1.0);
        last = next;
    }

    signals.timestamp = Some(TimestampSource::Machine);
    assert!(score(&signals, &weights) > last);
}

#[test]
fn extracted_tweet_scores_higher_than_partial_one() {
    let full = extract_document("https://x.com/jack/status/20", CONVERSATION, &offline()).unwrap();
    let partial = extract_document("https://x.com/ev/status/22", CONVERSATION, &offline()).unwrap();
    assert!(full.metadata.confidence >= partial.metadata.confidence);
    assert!(full.metadata.confidence <= 1.0);
}
