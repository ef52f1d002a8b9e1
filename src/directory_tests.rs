//! Tests for directory merge, reconciliation and filters

use super::*;

fn meta(id: &str, name: &str) -> ChannelMeta {
    ChannelMeta {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn stream(channel: &str, url: &str) -> StreamEntry {
    StreamEntry {
        channel: Some(channel.to_string()),
        url: Some(url.to_string()),
    }
}

fn logo(channel: &str, url: &str, width: f64) -> LogoEntry {
    LogoEntry {
        channel: Some(channel.to_string()),
        url: Some(url.to_string()),
        width: Some(width),
        height: None,
    }
}

fn merged(id: &str, country: &str, category: &str) -> MergedChannel {
    MergedChannel {
        id: id.to_string(),
        name: format!("{} TV", id),
        logo: None,
        url: format!("http://stream/{}", id),
        category: category.to_string(),
        country: country.to_string(),
    }
}

#[test]
fn test_merge_end_to_end_example() {
    let channels = [meta("a", "A"), meta("b", "B")];
    let streams = [stream("b", "http://x")];

    let out = merge(&channels, &streams, &[]);

    assert_eq!(
        out,
        vec![MergedChannel {
            id: "b".to_string(),
            name: "B".to_string(),
            logo: None,
            url: "http://x".to_string(),
            category: "Uncategorized".to_string(),
            country: "Unknown".to_string(),
        }]
    );
}

#[test]
fn test_merge_output_is_subset_in_input_order() {
    let channels = [meta("c", "C"), meta("a", "A"), meta("d", "D"), meta("b", "B")];
    let streams = [stream("b", "http://b"), stream("c", "http://c"), stream("zz", "http://zz")];

    let out = merge(&channels, &streams, &[]);
    let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();

    assert!(out.len() <= channels.len());
    assert_eq!(ids, ["c", "b"]);
}

#[test]
fn test_merge_duplicate_stream_last_wins() {
    let out = merge(&[meta("a", "A")], &[stream("a", "http://old"), stream("a", "http://new")], &[]);
    assert_eq!(out[0].url, "http://new");
}

#[test]
fn test_merge_urlless_stream_keeps_earlier_url() {
    let streams = [stream("a", "http://a"), StreamEntry { channel: Some("a".to_string()), url: None }];
    let out = merge(&[meta("a", "A")], &streams, &[]);
    assert_eq!(out[0].url, "http://a");
}

#[test]
fn test_merge_widest_logo_wins_either_order() {
    let channels = [meta("a", "A")];
    let streams = [stream("a", "http://a")];

    let asc = merge(&channels, &streams, &[logo("a", "small", 100.0), logo("a", "big", 200.0)]);
    let desc = merge(&channels, &streams, &[logo("a", "big", 200.0), logo("a", "small", 100.0)]);

    assert_eq!(asc[0].logo.as_deref(), Some("big"));
    assert_eq!(desc[0].logo.as_deref(), Some("big"));
}

#[test]
fn test_merge_equal_width_first_wins() {
    let out = merge(
        &[meta("a", "A")],
        &[stream("a", "http://a")],
        &[logo("a", "first", 512.0), logo("a", "second", 512.0)],
    );
    assert_eq!(out[0].logo.as_deref(), Some("first"));
}

#[test]
fn test_merge_channel_logo_takes_precedence() {
    let mut channel = meta("a", "A");
    channel.logo = Some("own".to_string());
    channel.categories = vec!["news".to_string(), "general".to_string()];
    channel.country = Some("TR".to_string());

    let out = merge(&[channel], &[stream("a", "http://a")], &[logo("a", "directory", 800.0)]);

    assert_eq!(out[0].logo.as_deref(), Some("own"));
    assert_eq!(out[0].category, "news");
    assert_eq!(out[0].country, "TR");
}

#[test]
fn test_merge_skips_unkeyable_records() {
    let nameless = ChannelMeta {
        id: Some("n".to_string()),
        ..Default::default()
    };
    let idless = ChannelMeta {
        name: Some("Ghost".to_string()),
        ..Default::default()
    };
    let streams = [
        stream("n", "http://n"),
        StreamEntry { channel: None, url: Some("http://orphan".to_string()) },
        StreamEntry { channel: Some("x".to_string()), url: None },
    ];

    let out = merge(&[idless, nameless, meta("x", "X")], &streams, &[]);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, "n");
    assert_eq!(out[0].name, "");
}

#[test]
fn test_merge_parses_directory_json() {
    let channels: Vec<ChannelMeta> = serde_json::from_str(
        r#"[{"id":"TRT1.tr","name":"TRT 1","categories":["general"],"country":"TR","website":"https://trt.net.tr"}]"#,
    )
    .unwrap();
    let streams: Vec<StreamEntry> =
        serde_json::from_str(r#"[{"channel":"TRT1.tr","feed":null,"url":"https://trt/1.m3u8","quality":"720p"}]"#).unwrap();
    let logos: Vec<LogoEntry> = serde_json::from_str(
        r#"[{"channel":"TRT1.tr","feed":null,"tags":[],"width":512,"height":512,"format":"PNG","url":"https://logo/trt1.png"}]"#,
    )
    .unwrap();

    let out = merge(&channels, &streams, &logos);
    assert_eq!(out[0].logo.as_deref(), Some("https://logo/trt1.png"));
    assert_eq!(out[0].category, "general");
}

#[test]
fn test_reconcile_prefers_fresh_keeps_stale() {
    let mut stale_a = merged("a", "TR", "news");
    stale_a.logo = None;
    let gone = merged("gone", "DE", "music");
    let mut fresh_a = merged("a", "TR", "news");
    fresh_a.logo = Some("http://logo/a.png".to_string());

    let out = reconcile(&[gone.clone(), stale_a], &[merged("b", "TR", "news"), fresh_a.clone()]);

    assert_eq!(out, vec![gone, fresh_a]);
}

#[test]
fn test_reconcile_collapses_duplicates() {
    let out = reconcile(&[merged("a", "TR", "x"), merged("b", "TR", "x"), merged("a", "TR", "x")], &[]);
    let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
}

#[test]
fn test_countries_pins_preferred() {
    let channels = [merged("1", "US", "x"), merged("2", "TR", "x"), merged("3", "DE", "x"), merged("4", "US", "x")];
    assert_eq!(countries(&channels, "TR"), ["All", "TR", "DE", "US"]);
    assert_eq!(countries(&channels, "FR"), ["All", "DE", "TR", "US"]);
}

#[test]
fn test_categories_sorted_unique() {
    let channels = [merged("1", "TR", "news"), merged("2", "TR", "kids"), merged("3", "TR", "news")];
    assert_eq!(categories(&channels), ["All", "kids", "news"]);
}

#[test]
fn test_filter_available_excludes_selected() {
    let channels = [merged("a", "TR", "news"), merged("b", "TR", "kids"), merged("c", "DE", "news")];
    let mut selection = Selection::new();
    selection.add(channels[0].clone());

    let filter = ChannelFilter {
        query: "tv".to_string(),
        country: "TR".to_string(),
        ..Default::default()
    };
    let ids: Vec<&str> = filter.available(&channels, &selection).iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["b"]);
}

#[test]
fn test_filter_query_is_case_insensitive() {
    let mut ch = merged("s", "TR", "sports");
    ch.name = "Şampiyon Spor".to_string();
    let filter = ChannelFilter {
        query: "SPOR".to_string(),
        ..Default::default()
    };
    assert!(filter.matches(&ch));
    assert!(ChannelFilter::default().matches(&ch));
}
