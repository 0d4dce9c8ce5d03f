//! Property tests for status mapping and stream record splitting.

use bytes::{Bytes, BytesMut};
use configwire_client::protocol::{split_records, HttpFrame, ReplyHeader};
use configwire_client::{ConfigHandler, ConfigRequest, ConfigResponse, ResponseStatus};
use proptest::prelude::*;

fn document_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9{}:\",]{1,24}"
}

fn flush_done(code: u16) -> bool {
    let mut handler = ConfigHandler::new("localhost");
    handler.encode(ConfigRequest::flush("default", ""));
    handler
        .decode(HttpFrame::Header(ReplyHeader::new(code, "Reason")))
        .unwrap();
    match handler.decode(HttpFrame::last()).unwrap() {
        Some(ConfigResponse::Flush(response)) => response.done,
        other => panic!("expected flush response, got {:?}", other),
    }
}

/// Feed a streaming body to a handler in the given pieces and collect the
/// documents a subscriber sees.
fn stream_documents(pieces: &[&[u8]]) -> Vec<String> {
    let mut handler = ConfigHandler::new("localhost");
    handler.encode(ConfigRequest::bucket_streaming("default", ""));

    let Some(ConfigResponse::BucketStreaming(response)) = handler
        .decode(HttpFrame::Header(ReplyHeader::new(200, "OK")))
        .unwrap()
    else {
        panic!("expected streaming response");
    };
    let mut sub = response.stream.subscribe();

    for piece in pieces {
        handler
            .decode(HttpFrame::Content(Bytes::copy_from_slice(piece)))
            .unwrap();
    }
    handler.decode(HttpFrame::last()).unwrap();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let mut documents = Vec::new();
        while let Some(document) = sub.next().await {
            documents.push(document);
        }
        documents
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn status_mapping_is_total(code in any::<u16>()) {
        let expected = match code {
            200 | 201 => ResponseStatus::Success,
            404 => ResponseStatus::NotFound,
            _ => ResponseStatus::Failure,
        };
        prop_assert_eq!(ResponseStatus::from_code(code), expected);
    }

    #[test]
    fn flush_done_unless_accepted(code in 100u16..600) {
        prop_assert_eq!(flush_done(code), code != 201);
    }

    #[test]
    fn records_survive_any_split_point(
        documents in prop::collection::vec(document_strategy(), 1..6),
        split in any::<prop::sample::Index>(),
    ) {
        let body: Vec<u8> = documents
            .iter()
            .flat_map(|doc| doc.bytes().chain(*b"\n\n\n\n"))
            .collect();
        let at = split.index(body.len() + 1);

        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(&body[..at]);
        let mut records = split_records(&mut buffer);
        buffer.extend_from_slice(&body[at..]);
        records.extend(split_records(&mut buffer));

        prop_assert_eq!(&records, &documents);
        prop_assert!(buffer.is_empty());
    }

    #[test]
    fn stream_delivery_independent_of_chunking(
        documents in prop::collection::vec(document_strategy(), 1..6),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
    ) {
        let body: Vec<u8> = documents
            .iter()
            .flat_map(|doc| doc.bytes().chain(*b"\n\n\n\n"))
            .collect();

        let mut offsets: Vec<usize> = cuts.iter().map(|cut| cut.index(body.len() + 1)).collect();
        offsets.push(0);
        offsets.push(body.len());
        offsets.sort_unstable();
        offsets.dedup();
        let pieces: Vec<&[u8]> = offsets.windows(2).map(|w| &body[w[0]..w[1]]).collect();

        prop_assert_eq!(stream_documents(&pieces), documents);
    }
}
