//! Raw TCP greeting server: accept, greet, close, drain.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::time::{Duration, Instant};

use matrix_server::{ConnectionServer, GreetingHandler, ServerError, GREETING};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};

mod common;

use common::{
    loopback_config, read_all, start_greeting_server, wait_until, FaultyListener, SlowHandler,
};

#[tokio::test]
async fn test_single_client_gets_greeting_then_eof() {
    let server = start_greeting_server().await;

    let received = read_all(server.local_addr()).await;
    assert_eq!(received, b"Welcome to the matrix\r\n");
    assert_eq!(received.len(), 23);

    server.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifty_concurrent_clients() {
    let server = start_greeting_server().await;
    let addr = server.local_addr();

    let clients: Vec<_> = (0..50)
        .map(|_| tokio::spawn(async move { read_all(addr).await }))
        .collect();

    for client in clients {
        assert_eq!(client.await.unwrap(), GREETING);
    }
    assert_eq!(server.connections_accepted(), 50);

    tokio::time::timeout(Duration::from_secs(5), server.close())
        .await
        .expect("close should finish once clients are done")
        .unwrap();
}

#[tokio::test]
async fn test_close_waits_for_slow_handler() {
    let handler = SlowHandler::new(Duration::from_millis(300));
    let server = ConnectionServer::spawn(&loopback_config(), handler)
        .await
        .unwrap();

    let mut client = TcpStream::connect(server.local_addr()).await.unwrap();
    assert!(
        wait_until(|| server.active_connections() == 1, Duration::from_secs(2)).await,
        "handler should start"
    );

    let started = Instant::now();
    server.close().await.unwrap();
    assert!(
        started.elapsed() >= Duration::from_millis(250),
        "close returned after {:?}, before the handler finished",
        started.elapsed()
    );

    let mut received = Vec::new();
    client.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, GREETING);
}

#[tokio::test]
async fn test_address_in_use_fails_without_spawning() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = occupied.local_addr().unwrap();

    let metrics = tokio::runtime::Handle::current().metrics();
    let tasks_before = metrics.num_alive_tasks();

    let mut config = loopback_config();
    config.listen_address = addr.to_string();
    let result = ConnectionServer::spawn(&config, GreetingHandler::new()).await;

    match result {
        Err(ServerError::Bind { address, source }) => {
            assert_eq!(address, addr.to_string());
            assert_eq!(source.kind(), std::io::ErrorKind::AddrInUse);
        }
        other => panic!("expected bind error, got {:?}", other.map(|s| s.local_addr())),
    }
    assert_eq!(metrics.num_alive_tasks(), tasks_before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_connection_ids_are_distinct_and_sequential() {
    let handler = SlowHandler::new(Duration::ZERO);
    let server = ConnectionServer::spawn(&loopback_config(), handler.clone())
        .await
        .unwrap();
    let addr = server.local_addr();

    let clients: Vec<_> = (0..20)
        .map(|_| tokio::spawn(async move { read_all(addr).await }))
        .collect();
    for client in clients {
        client.await.unwrap();
    }
    server.close().await.unwrap();

    let ids: Vec<u64> = handler.seen_ids().iter().map(|id| id.as_u64()).collect();
    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 20);
    assert_eq!(unique, (1..=20).collect::<HashSet<u64>>());
}

#[tokio::test]
async fn test_handler_timeout_releases_stuck_connection() {
    let mut config = loopback_config();
    config.handler_timeout_ms = 100;
    let server = ConnectionServer::spawn(&config, SlowHandler::new(Duration::from_secs(30)))
        .await
        .unwrap();

    let mut client = TcpStream::connect(server.local_addr()).await.unwrap();
    assert!(wait_until(|| server.active_connections() == 1, Duration::from_secs(2)).await);

    tokio::time::timeout(Duration::from_secs(2), server.close())
        .await
        .expect("timed-out handler should not block close")
        .unwrap();

    // The handler was aborted before writing anything.
    let mut received = Vec::new();
    let _ = client.read_to_end(&mut received).await;
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_no_connections_after_close() {
    let server = start_greeting_server().await;
    let addr = server.local_addr();
    server.close().await.unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_invalid_connection_limit_is_a_bind_error() {
    for max_connections in [0, usize::MAX] {
        let mut config = loopback_config();
        config.max_connections = max_connections;

        match ConnectionServer::spawn(&config, GreetingHandler::new()).await {
            Err(ServerError::Bind { source, .. }) => {
                assert_eq!(source.kind(), ErrorKind::InvalidInput);
            }
            other => panic!(
                "max_connections={max_connections}: expected bind error, got {:?}",
                other.map(|s| s.local_addr())
            ),
        }
    }
}

#[tokio::test]
async fn test_transient_accept_error_keeps_accepting() {
    let listener = FaultyListener::bind([Some(ErrorKind::ConnectionAborted)]).await;
    let server = ConnectionServer::serve(listener, &loopback_config(), GreetingHandler::new()).unwrap();

    let received = tokio::time::timeout(Duration::from_secs(2), read_all(server.local_addr()))
        .await
        .expect("accept loop should retry after a transient error");
    assert_eq!(received, GREETING);
    assert_eq!(server.connections_accepted(), 1);

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_fatal_accept_error_still_drains_on_close() {
    // First accept succeeds, the second fails for good.
    let listener = FaultyListener::bind([None, Some(ErrorKind::PermissionDenied)]).await;
    let handler = SlowHandler::new(Duration::from_millis(300));
    let server = ConnectionServer::serve(listener, &loopback_config(), handler).unwrap();
    let addr = server.local_addr();

    let started = Instant::now();
    let client = tokio::spawn(read_all(addr));
    assert!(
        wait_until(|| server.active_connections() == 1, Duration::from_secs(2)).await,
        "handler should start"
    );

    // The loop exits on the fatal error and releases the socket.
    let mut refused = false;
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_err() {
            refused = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(refused, "listener should stop accepting after a fatal error");

    server.close().await.unwrap();
    assert!(
        started.elapsed() >= Duration::from_millis(300),
        "close returned after {:?}, before the handler finished",
        started.elapsed()
    );
    assert_eq!(client.await.unwrap(), GREETING);
    assert!(TcpStream::connect(addr).await.is_err());
}
