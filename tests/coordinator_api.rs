//! Coordinator protocol over real HTTP, driven with `CoordinatorClient`

use minidfs::common::{build_http_client, ChunkId, CoordinatorConfig, FileId};
use minidfs::coordinator::CoordinatorClient;
use minidfs::{Coordinator, Error};
use std::time::Duration;
use tokio::net::TcpListener;

async fn start_coordinator(chunk_size: u64) -> CoordinatorClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let coordinator = Coordinator::new(CoordinatorConfig {
        chunk_size,
        ..Default::default()
    })
    .unwrap();
    tokio::spawn(coordinator.serve_on(listener, std::future::pending()));

    let http = build_http_client(Duration::from_secs(5)).unwrap();
    CoordinatorClient::new(&url, http)
}

fn remote_status(err: &Error) -> Option<u16> {
    match err {
        Error::Remote { status, .. } => Some(*status),
        _ => None,
    }
}

#[tokio::test]
async fn test_upload_plan_lists_registry_in_order() {
    let coord = start_coordinator(1000).await;

    let err = coord.plan_upload("a.txt", 2500).await.unwrap_err();
    assert_eq!(remote_status(&err), Some(503));

    coord.register_chunkserver("10.0.0.2:8001").await.unwrap();
    coord.register_chunkserver("10.0.0.1:8001").await.unwrap();
    coord.register_chunkserver("10.0.0.2:8001").await.unwrap();

    let plan = coord.plan_upload("a.txt", 2500).await.unwrap();
    assert_eq!(plan.identifier, FileId::from_name("a.txt"));
    assert_eq!(plan.chunk_size, 1000);
    assert_eq!(plan.number_of_chunks, 3);
    assert_eq!(plan.chunkservers, vec!["10.0.0.2:8001", "10.0.0.1:8001"]);
}

#[tokio::test]
async fn test_read_gated_until_every_chunk_acked() {
    let coord = start_coordinator(1000).await;
    coord.register_chunkserver("h1:1").await.unwrap();
    coord.register_chunkserver("h2:2").await.unwrap();

    let plan = coord.plan_upload("b.bin", 2000).await.unwrap();
    let id = plan.identifier;

    coord
        .report_chunk_upload(&ChunkId::new(id.clone(), 0), "h1:1")
        .await
        .unwrap();
    let err = coord.plan_read(&id).await.unwrap_err();
    assert_eq!(remote_status(&err), Some(404));

    coord
        .report_chunk_upload(&ChunkId::new(id.clone(), 1), "h2:2")
        .await
        .unwrap();
    coord
        .report_chunk_upload(&ChunkId::new(id.clone(), 1), "h1:1")
        .await
        .unwrap();

    let read = coord.plan_read(&id).await.unwrap();
    assert_eq!(read.file_name, "b.bin");
    assert_eq!(read.locations.len(), 2);
    assert_eq!(read.locations[0], "h1:1");
    assert!(read.locations[1] == "h1:1" || read.locations[1] == "h2:2");
}

#[tokio::test]
async fn test_reupload_resets_record() {
    let coord = start_coordinator(1000).await;
    coord.register_chunkserver("h1:1").await.unwrap();

    let plan = coord.plan_upload("c.txt", 10).await.unwrap();
    coord
        .report_chunk_upload(&ChunkId::new(plan.identifier.clone(), 0), "h1:1")
        .await
        .unwrap();
    assert!(coord.plan_read(&plan.identifier).await.is_ok());

    coord.plan_upload("c.txt", 10).await.unwrap();
    let err = coord.plan_read(&plan.identifier).await.unwrap_err();
    assert_eq!(remote_status(&err), Some(404));
}

#[tokio::test]
async fn test_ack_errors() {
    let coord = start_coordinator(1000).await;
    coord.register_chunkserver("h1:1").await.unwrap();

    let unknown = ChunkId::new(FileId::from_name("missing"), 0);
    let err = coord
        .report_chunk_upload(&unknown, "h1:1")
        .await
        .unwrap_err();
    assert_eq!(remote_status(&err), Some(404));

    let plan = coord.plan_upload("d.txt", 1500).await.unwrap();
    let out_of_range = ChunkId::new(plan.identifier, 2);
    let err = coord
        .report_chunk_upload(&out_of_range, "h1:1")
        .await
        .unwrap_err();
    assert_eq!(remote_status(&err), Some(400));
}

#[tokio::test]
async fn test_empty_file_readable_immediately() {
    let coord = start_coordinator(1000).await;
    coord.register_chunkserver("h1:1").await.unwrap();

    let plan = coord.plan_upload("empty", 0).await.unwrap();
    assert_eq!(plan.number_of_chunks, 0);

    let read = coord.plan_read(&plan.identifier).await.unwrap();
    assert!(read.locations.is_empty());
}
