use attendance_feed::{BoardHandler, FeedClient, FeedError, RenderSink, SessionFilter};

struct StdoutSink;

impl RenderSink for StdoutSink {
    fn append(&mut self, line: String) {
        println!("{line}");
    }
}

#[tokio::main]
async fn main() -> Result<(), FeedError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("attendance_feed=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(raw_url) = args.next() else {
        eprintln!("usage: board <relay-url> [lecture-name date time]");
        std::process::exit(2);
    };
    let url = url::Url::parse(&raw_url)?;

    let mut filter = SessionFilter::new();
    if let Some(lecture_name) = args.next() {
        filter = filter.lecture_name(lecture_name);
    }
    if let Some(date) = args.next() {
        filter = filter.date(date);
    }
    if let Some(time) = args.next() {
        filter = filter.time(time);
    }

    let client = FeedClient::new(url, filter.clone());
    let mut handler = BoardHandler::new(filter, Some(Box::new(StdoutSink)));
    client.run(&mut handler).await
}
