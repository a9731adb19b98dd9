// ABOUTME: End-to-end crawl tests against an httpmock-served blog.
// ABOUTME: Covers page ordering, cross-page dedupe, rejected pages and fatal first-page failures.

use harvest_core::{ArticleStore, Crawler, MemoryStore};
use httpmock::prelude::*;
use pretty_assertions::assert_eq;

fn listing_page(slugs: &[&str], pages: u32) -> String {
    let posts: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<article class="post"><h2 class="entry-title"><a href="/blogs/{slug}/">Post {slug}</a></h2><p>Excerpt</p></article>"#
            )
        })
        .collect();
    let pagination: String = (1..=pages)
        .map(|n| format!(r#"<a class="page-numbers" href="/blogs/page/{n}/">{n}</a>"#))
        .collect();
    format!(
        r#"<html><body><header><a href="/">Home</a></header>
        <main>{posts}</main>
        <nav class="pagination">{pagination}<a href="/blogs/page/2/">Next »</a></nav>
        </body></html>"#
    )
}

fn article_page(slug: &str) -> String {
    format!(
        r#"<html><body>
        <header class="site-header"><nav><a href="/">Home</a></nav></header>
        <main><article>
          <h1>Post {slug}</h1>
          <time datetime="2024-05-01">May 1, 2024</time>
          <div class="entry-content">
            <p>The {slug} article opens by describing the problem customers face every day.</p>
            <p>It then walks through the approach that the team took to solve it properly.</p>
            <p>Finally it closes with measurable results and a short list of lessons.</p>
          </div>
        </article></main>
        <footer>Copyright</footer>
        </body></html>"#
    )
}

fn serve_article<'a>(server: &'a MockServer, slug: &str) -> httpmock::Mock<'a> {
    let body = article_page(slug);
    let path = format!("/blogs/{}/", slug);
    server.mock(|when, then| {
        when.method(GET).path(path);
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(body);
    })
}

fn crawler(server: &MockServer) -> Crawler {
    Crawler::builder()
        .base_url(server.url("/blogs"))
        .allow_private_networks(true)
        .build()
        .unwrap()
}

#[tokio::test]
async fn two_page_crawl_orders_oldest_first() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/blogs");
        then.status(200).body(listing_page(&["p1a1", "p1a2"], 2));
    });
    server.mock(|when, then| {
        when.method(GET).path("/blogs/page/2/");
        then.status(200).body(listing_page(&["p2a1", "p2a2", "p2a3"], 2));
    });
    for slug in ["p1a1", "p1a2", "p2a1", "p2a2", "p2a3"] {
        serve_article(&server, slug);
    }

    let articles = crawler(&server).crawl(5).await.unwrap();
    let slugs: Vec<&str> = articles.iter().map(|a| a.slug.as_str()).collect();
    assert_eq!(slugs, vec!["p2a3", "p2a2", "p2a1", "p1a2", "p1a1"]);

    let first = &articles[0];
    assert_eq!(first.title, "Post p2a3");
    assert_eq!(first.source_url, server.url("/blogs/p2a3/"));
    assert_eq!(first.published_date, "May 1, 2024");
    assert!(first.content.contains("The p2a3 article opens"));
    assert!(!first.content.contains("Home"));
}

#[tokio::test]
async fn shared_links_are_fetched_once() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/blogs");
        then.status(200).body(listing_page(&["shared", "newest"], 2));
    });
    server.mock(|when, then| {
        when.method(GET).path("/blogs/page/2/");
        then.status(200).body(listing_page(&["oldest", "shared"], 2));
    });
    let shared = serve_article(&server, "shared");
    serve_article(&server, "newest");
    serve_article(&server, "oldest");

    let articles = crawler(&server).crawl(10).await.unwrap();
    let slugs: Vec<&str> = articles.iter().map(|a| a.slug.as_str()).collect();

    assert_eq!(slugs, vec!["shared", "oldest", "newest"]);
    assert_eq!(shared.hits(), 1);
}

#[tokio::test]
async fn rejected_and_failed_articles_are_skipped() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/blogs");
        then.status(200)
            .body(listing_page(&["good", "boilerplate", "gone"], 1));
    });
    serve_article(&server, "good");
    server.mock(|when, then| {
        when.method(GET).path("/blogs/boilerplate/");
        then.status(200).body(
            "<html><body><nav>Home About Contact</nav><main><p>Twenty chars here!!</p></main><footer>(c) 2024</footer></body></html>",
        );
    });
    server.mock(|when, then| {
        when.method(GET).path("/blogs/gone/");
        then.status(404);
    });

    let articles = crawler(&server).crawl(5).await.unwrap();
    let slugs: Vec<&str> = articles.iter().map(|a| a.slug.as_str()).collect();
    assert_eq!(slugs, vec!["good"]);
}

#[tokio::test]
async fn failed_article_is_backfilled_when_target_binds() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/blogs");
        then.status(200)
            .body(listing_page(&["a1", "a2", "a3", "broken"], 1));
    });
    let broken = server.mock(|when, then| {
        when.method(GET).path("/blogs/broken/");
        then.status(503);
    });
    for slug in ["a1", "a2", "a3"] {
        serve_article(&server, slug);
    }

    let articles = crawler(&server).crawl(2).await.unwrap();
    let slugs: Vec<&str> = articles.iter().map(|a| a.slug.as_str()).collect();
    assert_eq!(slugs, vec!["a3", "a2"]);
    assert_eq!(broken.hits(), 1);
}

#[tokio::test]
async fn first_listing_failure_is_fatal() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/blogs");
        then.status(500);
    });

    let err = crawler(&server).crawl(5).await.unwrap_err();
    assert!(err.is_crawl_failed(), "{}", err);
}

#[tokio::test]
async fn crawl_into_store_upserts_by_source_url() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/blogs");
        then.status(200).body(listing_page(&["one", "two"], 1));
    });
    serve_article(&server, "one");
    serve_article(&server, "two");

    let crawler = crawler(&server);
    let mut store = MemoryStore::new();
    crawler.crawl_into(5, &mut store).await.unwrap();
    crawler.crawl_into(5, &mut store).await.unwrap();

    let all = store.find_all();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|r| !r.is_updated));
}
