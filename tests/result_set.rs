mod common;

use common::{FakeIndex, param};
use esgf_search::{Constraints, Error, ErrorKind, Record, ResultSet, SearchType};

#[test]
fn every_index_maps_to_its_batch_slot() {
    let index = FakeIndex::new(23);
    let ctx = index
        .connection()
        .new_context(Constraints::new().add("project", "CMIP5"))
        .unwrap();
    let results = ctx.search_with(5, false).unwrap();

    assert_eq!(results.len(), 23);
    for i in 0..23 {
        let r = results.get(i).unwrap();
        assert_eq!(r.id().unwrap(), format!("ds.{}|node", i));
    }

    let batches = index.batch_requests();
    assert_eq!(batches.len(), 5);
    let offsets: Vec<_> = batches.iter().map(|u| param(u, "offset").unwrap()).collect();
    assert_eq!(offsets, vec!["0", "5", "10", "15", "20"]);
    assert!(batches.iter().all(|u| param(u, "limit").as_deref() == Some("5")));
}

#[test]
fn repeated_access_fetches_each_batch_once() {
    let index = FakeIndex::new(12);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();
    let results = ctx.search_with(4, false).unwrap();

    for _ in 0..3 {
        results.get(9).unwrap();
        results.get(8).unwrap();
        results.get(1).unwrap();
    }

    assert_eq!(index.batch_requests().len(), 2);
    assert_eq!(results.fetched_batches(), 2);
    assert_eq!(results.len(), 12);
}

#[test]
fn eager_mode_fetches_first_batch_up_front() {
    let index = FakeIndex::new(7);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();

    let results = ctx.search_with(3, true).unwrap();
    assert_eq!(index.batch_requests().len(), 1);
    assert_eq!(results.fetched_batches(), 1);

    results.get(2).unwrap();
    assert_eq!(index.batch_requests().len(), 1);

    let lazy = ctx.search_with(3, false).unwrap();
    assert_eq!(lazy.fetched_batches(), 0);
}

#[test]
fn hit_count_is_fetched_once_per_context() {
    let index = FakeIndex::new(7);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();

    assert_eq!(ctx.hit_count().unwrap(), 7);
    assert_eq!(ctx.hit_count().unwrap(), 7);
    let _a = ctx.search_with(3, false).unwrap();
    let _b = ctx.search_with(5, false).unwrap();

    assert_eq!(index.request_count(), 1);
    assert_eq!(param(&index.requests()[0], "limit").as_deref(), Some("0"));
}

#[test]
fn out_of_range_index_is_a_usage_error_without_a_request() {
    let index = FakeIndex::new(4);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();
    let results = ctx.search_with(2, false).unwrap();
    let before = index.request_count();

    let err = results.get(4).unwrap_err();
    assert!(matches!(err, Error::IndexOutOfRange { index: 4, len: 4 }));
    assert_eq!(err.kind(), ErrorKind::Usage);
    assert_eq!(index.request_count(), before);
}

#[test]
fn empty_result_set_never_fetches() {
    let index = FakeIndex::new(0);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();
    let results = ctx.search().unwrap();

    assert!(results.is_empty());
    assert_eq!(results.iter().count(), 0);
    assert!(results.get(0).is_err());
    assert!(index.batch_requests().is_empty());
}

#[test]
fn zero_batch_size_is_rejected() {
    let index = FakeIndex::new(3);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();
    assert!(matches!(ctx.search_with(0, false), Err(Error::Usage(_))));
}

#[test]
fn failed_batch_keeps_cached_batches() {
    let index = FakeIndex::new(10);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();
    let results = ctx.search_with(5, true).unwrap();

    index.fail_once_at(5);
    let err = results.get(6).unwrap_err();
    assert!(matches!(err, Error::Status { status: 503, .. }));
    assert_eq!(err.kind(), ErrorKind::Connection);

    let before = index.request_count();
    assert_eq!(results.get(0).unwrap().id().unwrap(), "ds.0|node");
    assert_eq!(index.request_count(), before);

    assert_eq!(results.get(6).unwrap().id().unwrap(), "ds.6|node");
    assert_eq!(index.batch_requests().len(), 3);
}

#[test]
fn short_batch_is_a_response_error() {
    let index = FakeIndex::new(10);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();
    let results = ctx.search_with(5, false).unwrap();

    index.reply_once(Ok(esgf_search::HttpReply {
        status: 200,
        body: r#"{"response":{"numFound":10,"docs":[{"id":"only"}]}}"#.to_string(),
    }));
    let err = results.get(3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseFormat);
}

#[test]
fn iteration_yields_every_record_in_order() {
    let index = FakeIndex::new(11);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();
    let results = ctx.search_with(4, false).unwrap();

    let ids: Vec<String> = results
        .iter()
        .map(|r| r.unwrap().id().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 11);
    assert_eq!(ids[10], "ds.10|node");
    assert_eq!(results.iter().count(), 11);
    assert_eq!(index.batch_requests().len(), 3);
}

#[test]
fn iteration_stops_at_first_failed_batch() {
    let index = FakeIndex::new(12);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();
    let results = ctx.search_with(4, false).unwrap();

    index.fail_once_at(4);
    let items: Vec<_> = results.iter().collect();
    assert_eq!(items.len(), 5);
    assert!(items[..4].iter().all(|r| r.is_ok()));
    assert!(matches!(items[4], Err(Error::Status { status: 503, .. })));
    assert_eq!(index.batch_requests().len(), 2);

    assert_eq!(results.get(4).unwrap().id().unwrap(), "ds.4|node");
    assert_eq!(index.batch_requests().len(), 3);
}

#[test]
fn custom_builder_replaces_result_wrapping() {
    let index = FakeIndex::new(3);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();
    let results = ResultSet::with_builder(ctx, 2, false, |json, ctx| {
        format!("{}:{}", ctx.search_type(), json["id"].as_str().unwrap_or(""))
    })
    .unwrap();

    assert_eq!(results.get(2).unwrap(), "Dataset:ds.2|node");
}

#[test]
fn file_search_from_dataset_result() {
    let index = FakeIndex::new(3);
    let ctx = index
        .connection()
        .new_context(Constraints::new().add("project", "CMIP5"))
        .unwrap();
    let datasets = ctx.search().unwrap();
    let dataset = datasets.get(0).unwrap();
    let dataset = dataset.as_dataset().unwrap();

    let files = dataset.file_context().unwrap().search().unwrap();
    let file = files.get(1).unwrap();
    let file = file.as_file().unwrap();

    assert_eq!(file.filename().unwrap(), "tas_1.nc");
    assert_eq!(file.size().unwrap(), 1001);
    assert_eq!(file.checksum().unwrap(), "sum1");
    assert_eq!(file.checksum_type().unwrap(), "SHA256");
    assert_eq!(file.url().as_deref(), Some("http://data.test/files/tas_1.nc"));
    assert_eq!(
        file.opendap_url().as_deref(),
        Some("http://data.test/dodsC/tas_1.nc")
    );

    let last = index.requests().pop().unwrap();
    assert_eq!(param(&last, "type").as_deref(), Some("File"));
    assert_eq!(param(&last, "dataset_id").as_deref(), Some("ds.0|node"));
    assert_eq!(param(&last, "project"), None);
}

#[test]
fn aggregation_search_from_dataset_result() {
    let index = FakeIndex::new(2);
    let ctx = index.connection().new_context(Constraints::new()).unwrap();
    let datasets = ctx.search().unwrap();
    let dataset = datasets.get(1).unwrap();

    let aggs = dataset
        .as_dataset()
        .unwrap()
        .aggregation_context()
        .unwrap()
        .search()
        .unwrap();
    assert_eq!(aggs.context().search_type(), SearchType::Aggregation);

    let agg = aggs.get(0).unwrap();
    let urls = agg.urls();
    let las = &urls["LAS"][0].0;
    assert!(las.contains(".aggregation"));
    assert_eq!(agg.as_aggregation().unwrap().aggregation_id().unwrap(), "agg.0|node");
}
