use std::time::Duration;

use rs_social_extract::options::ThrottleOptions;
use rs_social_extract::platforms::{ExtractionPhase, TwitterExtractor, TwitterStrategy};
use rs_social_extract::{
    ContentKind, Error, ErrorKind, KindDetails, MemoryPage, Options, PlatformExtractor, SettingsOverrides,
};
use tokio::time::Instant;

fn tweet(user: &str, id: u64, text: &str) -> String {
    format!(
        r#"<div data-testid="cellInnerDiv"><article data-testid="tweet" role="article">
  <div data-testid="User-Name">
    <div><a href="/{user}" role="link"><span>{user}</span></a></div>
    <div><a href="/{user}" role="link" tabindex="-1"><span>@{user}</span></a>
         <a href="/{user}/status/{id}" role="link"><time datetime="2024-05-01T10:00:00.000Z">May 1</time></a></div>
  </div>
  <div data-testid="tweetText" lang="en" dir="auto">{text}</div>
</article></div>"#
    )
}

fn page(tweets: &[String], extra: &str) -> String {
    format!(
        r#"<html><body><main role="main"><div data-testid="primaryColumn">{}{extra}</div></main></body></html>"#,
        tweets.concat()
    )
}

fn conversation() -> String {
    page(
        &[tweet("jack", 20, "just setting up my twttr"), tweet("biz", 21, "welcome!")],
        "",
    )
}

/// Options without delays, with live features left as configured.
fn unthrottled() -> Options {
    Options {
        throttle: ThrottleOptions::unthrottled(),
        ..Options::default()
    }
}

#[tokio::test(start_paused = true)]
async fn repeated_call_is_served_from_cache() {
    let extractor = TwitterExtractor::new(TwitterStrategy, &Options::default());
    let host = MemoryPage::new("https://x.com/jack/status/20", conversation());

    let first = extractor.extract_page_content(&host).await.unwrap();
    let snapshots = host.snapshot_count();
    let second = extractor.extract_page_content(&host).await.unwrap();

    assert_eq!(host.snapshot_count(), snapshots);
    assert_eq!(first, second);
    assert_eq!(extractor.cached_entries(), 1);
    assert_eq!(extractor.phase(), ExtractionPhase::Succeeded);
}

#[tokio::test(start_paused = true)]
async fn cleanup_drops_cached_results() {
    let extractor = TwitterExtractor::new(TwitterStrategy, &Options::offline());
    let host = MemoryPage::new("https://x.com/jack/status/20", conversation());

    extractor.extract_page_content(&host).await.unwrap();
    extractor.cleanup();
    assert_eq!(extractor.cached_entries(), 0);
    assert_eq!(extractor.phase(), ExtractionPhase::Idle);

    extractor.extract_page_content(&host).await.unwrap();
    assert_eq!(host.snapshot_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn transient_host_failures_are_retried() {
    let extractor = TwitterExtractor::new(TwitterStrategy, &Options::offline());
    let host = MemoryPage::new("https://x.com/jack/status/20", conversation());
    host.fail_snapshots(2);

    let tweet = extractor.extract_page_content(&host).await.unwrap();
    assert_eq!(tweet.id, "20");
    assert_eq!(host.snapshot_count(), 3);

    let session = extractor.session();
    assert_eq!(session.retry_count, 2);
    assert_eq!(session.errors(ErrorKind::Host), 2);
}

#[tokio::test(start_paused = true)]
async fn attempts_are_bounded() {
    let extractor = TwitterExtractor::new(TwitterStrategy, &Options::offline());
    let host = MemoryPage::new("https://x.com/jack/status/20", conversation());
    host.fail_snapshots(10);

    let err = extractor.extract_page_content(&host).await.unwrap_err();
    assert!(matches!(err, Error::Host(_)));
    assert_eq!(host.snapshot_count(), 3);
    assert_eq!(extractor.phase(), ExtractionPhase::Failed);
    assert_eq!(extractor.cached_entries(), 0);
}

#[tokio::test(start_paused = true)]
async fn retries_back_off_between_attempts() {
    let options = Options {
        features: Options::offline().features,
        ..Options::default()
    };
    let extractor = TwitterExtractor::new(TwitterStrategy, &options);
    let host = MemoryPage::new("https://x.com/jack/status/20", conversation());
    host.fail_snapshots(1);

    let started = Instant::now();
    extractor.extract_page_content(&host).await.unwrap();
    let elapsed = started.elapsed();

    // One backoff of 1 s plus up to 30 % jitter; the after-error gate (2 s)
    // overlaps with it.
    assert!(elapsed >= Duration::from_millis(1_000), "{elapsed:?}");
    assert!(elapsed <= Duration::from_millis(2_100), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn slow_page_times_out() {
    let mut options = Options::offline();
    options.throttle.max_attempts = 1;
    options.throttle.extraction_timeout_ms = 10_000;
    let extractor = TwitterExtractor::new(TwitterStrategy, &options);
    let host = MemoryPage::new("https://x.com/jack/status/20", conversation());
    host.set_snapshot_delay(Duration::from_secs(30));

    let started = Instant::now();
    let err = extractor.extract_page_content(&host).await.unwrap_err();

    assert_eq!(err, Error::ExtractionTimeout(10_000));
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert!(started.elapsed() < Duration::from_secs(11));
    assert_eq!(extractor.session().errors(ErrorKind::ExtractionTimeout), 1);
}

#[tokio::test(start_paused = true)]
async fn session_cap_denies_with_reason() {
    let mut options = Options::offline();
    options.throttle.session_cap_override = Some(1);
    let extractor = TwitterExtractor::new(TwitterStrategy, &options);
    let html = conversation();

    let first = MemoryPage::new("https://x.com/jack/status/20", html.clone());
    extractor.extract_page_content(&first).await.unwrap();

    let second = MemoryPage::new("https://x.com/biz/status/21", html);
    let err = extractor.extract_page_content(&second).await.unwrap_err();
    let Error::RateLimitExceeded { reason } = &err else {
        panic!("expected a rate-limit denial, got {err:?}");
    };
    assert!(reason.contains("session cap of 1"));
    assert_eq!(second.snapshot_count(), 0);
    assert_eq!(extractor.session().errors(ErrorKind::RateLimitExceeded), 1);

    // The cached item is still served.
    assert!(extractor.extract_page_content(&first).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn timeline_items_count_against_the_session_cap() {
    let mut options = Options::offline();
    options.throttle.session_cap_override = Some(2);
    let extractor = TwitterExtractor::new(TwitterStrategy, &options);
    let host = MemoryPage::new(
        "https://x.com/home",
        page(
            &[tweet("jack", 20, "first"), tweet("biz", 21, "second"), tweet("ev", 22, "third")],
            "",
        ),
    );

    let items = extractor.extract_items(&host).await.unwrap();
    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["20", "21"]);
    assert_eq!(extractor.session().item_counts.get(&ContentKind::Tweet), Some(&2));

    let err = extractor.extract_items(&host).await.unwrap_err();
    let Error::RateLimitExceeded { reason } = &err else {
        panic!("expected a rate-limit denial, got {err:?}");
    };
    assert!(reason.contains("session cap of 2"));
    assert_eq!(host.snapshot_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn thread_entries_count_against_their_cap() {
    let mut options = Options::offline();
    options.throttle.session_cap_override = Some(1);
    let extractor = TwitterExtractor::new(TwitterStrategy, &options);
    let host = MemoryPage::new(
        "https://x.com/jack/status/20",
        page(
            &[
                tweet("jack", 20, "just setting up my twttr"),
                tweet("biz", 21, "welcome!"),
                tweet("ev", 22, "me too"),
            ],
            "",
        ),
    );

    let focal = extractor.extract_page_content(&host).await.unwrap();
    let ids: Vec<&str> = focal.replies.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["21"]);

    let session = extractor.session();
    assert_eq!(session.item_counts.get(&ContentKind::ThreadEntry), Some(&1));
    assert_eq!(session.errors(ErrorKind::RateLimitExceeded), 1);
}

#[tokio::test(start_paused = true)]
async fn interleaved_keys_each_extract_once() {
    let extractor = TwitterExtractor::new(TwitterStrategy, &Options::offline());
    let html = conversation();
    let short = MemoryPage::new("https://x.com/jack/status/20", html.clone());
    short.set_snapshot_delay(Duration::from_millis(300));
    let long = MemoryPage::new("https://x.com/biz/status/21", html);
    long.set_snapshot_delay(Duration::from_millis(600));

    let late_join = async {
        // The short extraction has finished; the long one is still running.
        tokio::time::sleep(Duration::from_millis(400)).await;
        extractor.extract_page_content(&long).await
    };
    let (a, b, c) = tokio::join!(
        extractor.extract_page_content(&short),
        extractor.extract_page_content(&long),
        late_join
    );

    assert_eq!(a.unwrap().id, "20");
    let b = b.unwrap();
    assert_eq!(b.id, "21");
    assert_eq!(c.unwrap(), b);
    assert_eq!(short.snapshot_count(), 1);
    assert_eq!(long.snapshot_count(), 1);
    assert_eq!(extractor.phase(), ExtractionPhase::Succeeded);
}

#[tokio::test(start_paused = true)]
async fn host_override_changes_the_cap() {
    let extractor = TwitterExtractor::new(TwitterStrategy, &Options::offline());
    extractor.apply_overrides(&SettingsOverrides {
        session_cap: Some(0),
        ..SettingsOverrides::default()
    });
    let host = MemoryPage::new("https://x.com/jack/status/20", conversation());

    let err = extractor.extract_page_content(&host).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
}

#[tokio::test(start_paused = true)]
async fn tracking_preference_blocks_extraction() {
    let extractor = TwitterExtractor::new(TwitterStrategy, &Options::offline());
    let host = MemoryPage::new("https://x.com/jack/status/20", conversation());
    host.set_do_not_track(true);

    let err = extractor.extract_page_content(&host).await.unwrap_err();
    assert!(matches!(err, Error::ComplianceBlocked { .. }));
    assert!(!err.is_retryable());
    assert_eq!(host.snapshot_count(), 0);

    let items = extractor.extract_items(&host).await;
    assert!(matches!(items, Err(Error::ComplianceBlocked { .. })));
}

#[tokio::test(start_paused = true)]
async fn tracking_preference_can_be_ignored() {
    let mut options = Options::offline();
    options.features.respect_tracking_preference = false;
    let extractor = TwitterExtractor::new(TwitterStrategy, &options);
    let host = MemoryPage::new("https://x.com/jack/status/20", conversation());
    host.set_do_not_track(true);

    assert!(extractor.extract_page_content(&host).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn concurrent_calls_share_one_extraction() {
    let extractor = TwitterExtractor::new(TwitterStrategy, &Options::offline());
    let host = MemoryPage::new("https://x.com/jack/status/20", conversation());
    host.set_snapshot_delay(Duration::from_millis(300));

    let (a, b) = tokio::join!(extractor.extract_page_content(&host), extractor.extract_page_content(&host));

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(host.snapshot_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn thread_is_expanded_through_show_more() {
    let extractor = TwitterExtractor::new(TwitterStrategy, &unthrottled());
    let first = tweet("jack", 20, "just setting up my twttr");
    let second = tweet("biz", 21, "welcome!");
    let third = tweet("ev", 22, "me too");

    let initial = page(
        &[first.clone(), second.clone()],
        r#"<div role="button" data-testid="showMoreReplies">Show more replies</div>"#,
    );
    let loading = page(&[first.clone(), second.clone()], r#"<div role="progressbar"></div>"#);
    let loaded = page(&[first, second, third], "");

    let host = MemoryPage::new("https://x.com/jack/status/20", initial);
    host.on_click(r#"[data-testid="showMoreReplies"]"#, vec![loading, loaded]);

    let tweet = extractor.extract_page_content(&host).await.unwrap();

    assert_eq!(host.clicks().len(), 1);
    let ids: Vec<&str> = tweet.replies.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["21", "22"]);
    assert!(matches!(tweet.replies[1].details, KindDetails::ThreadEntry { position: 1, .. }));
}

#[tokio::test(start_paused = true)]
async fn timeline_items_are_all_extracted() {
    let extractor = TwitterExtractor::new(TwitterStrategy, &Options::offline());
    let host = MemoryPage::new(
        "https://x.com/home",
        page(
            &[tweet("jack", 20, "first"), tweet("biz", 21, "second"), tweet("ev", 22, "third")],
            "",
        ),
    );

    let items = extractor.extract_items(&host).await.unwrap();
    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["20", "21", "22"]);
    assert!(items.iter().all(|i| i.metadata.confidence > 0.0));

    let main = extractor.extract_page_content(&host).await.unwrap();
    assert_eq!(main.id, "20");
    assert!(main.replies.is_empty());
}
