//! Bot ingress integration tests.
//!
//! Chat messages are validated and submitted to the same pool the HTTP API
//! uses; the poller feeds updates from a scripted transport.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::{broadcast, Mutex};

use reelbot_core::{
    bot::{
        BotIngress, BotPoller, BotTransport, IncomingMessage, ACCEPTED_REPLY, GREETING,
        INVALID_URL_REPLY,
    },
    job::JobOrigin,
    notifier::{Chat, IncomingUser, Message, NotifyError, Update},
    pool::{PoolConfig, RejectReason, SubmitOutcome, WorkerPool},
    testing::{fixtures, MockFetcher, MockSink, MockTransformer},
};

fn start_pool(temp_dir: &TempDir, fetcher: Arc<MockFetcher>, config: PoolConfig) -> Arc<WorkerPool> {
    let runner = fixtures::runner(
        temp_dir.path(),
        fetcher,
        Arc::new(MockTransformer::new()),
        Arc::new(MockSink::new()),
    );
    Arc::new(WorkerPool::start(config.with_temp_dir(temp_dir.path()), runner))
}

fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id,
            from: Some(IncomingUser {
                id: chat_id,
                is_bot: false,
                username: None,
            }),
            chat: Chat { id: chat_id },
            text: Some(text.to_string()),
        }),
    }
}

/// Transport replaying scripted poll results, then idling.
#[derive(Default)]
struct ScriptedTransport {
    batches: Mutex<VecDeque<Result<Vec<Update>, NotifyError>>>,
    offsets: Mutex<Vec<Option<i64>>>,
    replies: Mutex<Vec<(i64, String)>>,
}

#[async_trait]
impl BotTransport for ScriptedTransport {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        _timeout_secs: u64,
    ) -> Result<Vec<Update>, NotifyError> {
        self.offsets.lock().await.push(offset);
        let next = self.batches.lock().await.pop_front();
        match next {
            Some(batch) => batch,
            None => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        self.replies.lock().await.push((chat_id, text.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn test_start_command_greets() {
    let temp_dir = TempDir::new().unwrap();
    let pool = start_pool(&temp_dir, Arc::new(MockFetcher::new()), PoolConfig::default());
    let ingress = BotIngress::new(Arc::clone(&pool));

    assert_eq!(
        ingress.handle(&IncomingMessage::new(1, 1, "/start")),
        Some(GREETING.to_string())
    );
    assert_eq!(
        ingress.handle(&IncomingMessage::new(1, 1, "/start@reel_bot")),
        Some(GREETING.to_string())
    );
    assert_eq!(ingress.handle(&IncomingMessage::new(1, 1, "/help")), None);
    assert!(pool.active_jobs().is_empty());
}

#[tokio::test]
async fn test_invalid_url_is_not_submitted() {
    let temp_dir = TempDir::new().unwrap();
    let pool = start_pool(&temp_dir, Arc::new(MockFetcher::new()), PoolConfig::default());
    let ingress = BotIngress::new(Arc::clone(&pool));

    let reply = ingress.handle(&IncomingMessage::new(1, 1, "ftp://example.com/v1"));
    assert_eq!(reply, Some(INVALID_URL_REPLY.to_string()));

    tokio::time::sleep(Duration::from_millis(20)).await;
    let status = pool.status();
    assert_eq!(status.total_completed + status.total_failed, 0);
}

#[tokio::test]
async fn test_valid_url_is_submitted_as_bot_job() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.hold();
    let pool = start_pool(&temp_dir, Arc::clone(&fetcher), PoolConfig::default());
    let ingress = BotIngress::new(Arc::clone(&pool));

    let reply = ingress.handle(&IncomingMessage::new(70, 7, "  https://example.com/reel/1  "));
    assert_eq!(reply, Some(ACCEPTED_REPLY.to_string()));

    let jobs = pool.active_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].origin, JobOrigin::Bot { user_id: 7 });
    assert_eq!(jobs[0].source_url, "https://example.com/reel/1");

    fetcher.release();
    pool.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_saturated_pool_answers_try_again() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.hold();
    let pool = start_pool(
        &temp_dir,
        Arc::clone(&fetcher),
        PoolConfig::default().with_limits(1, 1),
    );
    let ingress = BotIngress::new(Arc::clone(&pool));

    let message = IncomingMessage::new(70, 7, "https://example.com/v");
    assert_eq!(ingress.handle(&message), Some(ACCEPTED_REPLY.to_string()));
    tokio::time::timeout(Duration::from_secs(5), async {
        while pool.status().active_jobs == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(ingress.handle(&message), Some(ACCEPTED_REPLY.to_string()));

    let reply = ingress.handle(&message).unwrap();
    assert!(reply.contains("try again later"), "unexpected reply: {}", reply);

    fetcher.release();
    pool.shutdown().await.unwrap();
}

async fn wait_for_active(pool: &WorkerPool, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while pool.status().active_jobs < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("jobs did not start in time");
}

#[tokio::test]
async fn test_api_jobs_fill_capacity_for_bot() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.hold();
    let pool = start_pool(
        &temp_dir,
        Arc::clone(&fetcher),
        PoolConfig::default().with_limits(1, 1),
    );
    let ingress = BotIngress::new(Arc::clone(&pool));

    assert!(pool.submit(fixtures::api_job("https://example.com/api/1")).is_accepted());
    wait_for_active(&pool, 1).await;
    assert!(pool.submit(fixtures::api_job("https://example.com/api/2")).is_accepted());

    let reply = ingress
        .handle(&IncomingMessage::new(70, 7, "https://example.com/bot"))
        .unwrap();
    assert!(reply.contains("try again later"), "unexpected reply: {}", reply);
    assert!(pool
        .active_jobs()
        .iter()
        .all(|job| matches!(job.origin, JobOrigin::Api { .. })));

    fetcher.release();
    pool.shutdown().await.unwrap();
    assert_eq!(pool.status().total_completed, 2);
}

#[tokio::test]
async fn test_bot_jobs_fill_capacity_for_api() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.hold();
    let pool = start_pool(
        &temp_dir,
        Arc::clone(&fetcher),
        PoolConfig::default().with_limits(1, 1),
    );
    let ingress = BotIngress::new(Arc::clone(&pool));

    let message = IncomingMessage::new(70, 7, "https://example.com/bot");
    assert_eq!(ingress.handle(&message), Some(ACCEPTED_REPLY.to_string()));
    wait_for_active(&pool, 1).await;
    assert_eq!(ingress.handle(&message), Some(ACCEPTED_REPLY.to_string()));

    let outcome = pool.submit(fixtures::api_job("https://example.com/api"));
    assert_eq!(outcome, SubmitOutcome::Rejected(RejectReason::Saturated));

    fetcher.release();
    pool.shutdown().await.unwrap();
    assert_eq!(pool.status().total_completed, 2);
}

#[tokio::test]
async fn test_poller_dispatches_and_advances_offset() {
    let temp_dir = TempDir::new().unwrap();
    let pool = start_pool(&temp_dir, Arc::new(MockFetcher::new()), PoolConfig::default());

    let transport = Arc::new(ScriptedTransport::default());
    {
        let mut batches = transport.batches.lock().await;
        batches.push_back(Err(NotifyError::Timeout));
        batches.push_back(Ok(vec![
            text_update(10, 70, "/start"),
            text_update(11, 71, "not a url"),
        ]));
        batches.push_back(Ok(vec![text_update(12, 72, "https://example.com/v1")]));
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let poller = BotPoller::new(
        Arc::clone(&transport) as Arc<dyn BotTransport>,
        BotIngress::new(Arc::clone(&pool)),
        1,
    )
    .with_backoff(Duration::from_millis(5));
    let handle = tokio::spawn(poller.run(shutdown_rx));

    tokio::time::timeout(Duration::from_secs(5), async {
        while transport.replies.lock().await.len() < 3 || transport.offsets.lock().await.len() < 4 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("poller did not reply");

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    let replies = transport.replies.lock().await.clone();
    assert_eq!(replies[0], (70, GREETING.to_string()));
    assert_eq!(replies[1], (71, INVALID_URL_REPLY.to_string()));
    assert_eq!(replies[2], (72, ACCEPTED_REPLY.to_string()));

    let offsets = transport.offsets.lock().await.clone();
    assert_eq!(&offsets[..3], &[None, None, Some(12)]);
    assert_eq!(offsets[3], Some(13));

    pool.shutdown().await.unwrap();
}
