use std::time::Duration;

use anyhow::Context;
use nmb_client::{
    Client, DeliveryQueue, JsonEngine, Method, NmbRequest, Outcome, Registry, Response, Site,
};
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // setting up logging.
    SimpleLogger::new().init()?;

    // One engine per site. This one knows the forum and thread endpoints.
    let engine = JsonEngine::new(Site::Ac, "https://h.nimingban.com")
        .with_post_list("/Api/showf?id={forum}&page={page}")
        .with_post("/Api/thread?id={id}&page={page}");

    // Callbacks are delivered on this task, through the queue.
    let (mut queue, deliverer) = DeliveryQueue::new();
    let client = Client::new(Registry::new().with(engine), deliverer)
        .context("failed to start the client")?;

    let request = NmbRequest::new(
        Site::Ac,
        Method::PostList {
            forum: "4".into(),
            page: 1,
        },
        |outcome: Outcome| match outcome {
            Outcome::Success(Response::PostList(posts)) => {
                for post in posts.iter().take(5) {
                    println!(
                        "No.{} [{}] {} replies: {}",
                        post.id(),
                        post.title().unwrap_or("-"),
                        post.reply_count().unwrap_or(0),
                        post.content()
                    );
                }
            }
            Outcome::Success(other) => println!("unexpected response: {other:?}"),
            Outcome::Failure(e) => eprintln!("fetch failed: {e}"),
            Outcome::Cancelled => println!("cancelled"),
        },
    );
    let handle = client.execute(request);

    // Give up after ten seconds; the callback still fires, as `Cancelled`.
    if tokio::time::timeout(Duration::from_secs(10), queue.dispatch_next())
        .await
        .is_err()
    {
        handle.cancel();
        // a request cancelled before it started reports inline, not through the queue
        let _ = tokio::time::timeout(Duration::from_secs(1), queue.dispatch_next()).await;
    }

    Ok(())
}
