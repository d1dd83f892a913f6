use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::intake::{BatchRejection, MAX_FILE_SIZE_BYTES};
use crate::lane::{BatchOutcome, BatchReport};
use crate::models::{AttachmentClass, CandidateFile, UserId};
use crate::records::MemoryRecordStore;
use crate::reference::ReferenceValidator;
use crate::screen::{EditScreen, RemovalOutcome};
use crate::state::{LanePhase, LoadStatus, ERROR_DISPLAY, PROGRESS_RESET_DELAY};
use crate::storage::MemoryBlobStore;
use crate::Error;

const CDN: &str = "https://cdn.example.com";

type Screen = EditScreen<MemoryBlobStore, MemoryRecordStore>;

fn validator() -> ReferenceValidator {
    ReferenceValidator::new("https://acct.r2.cloudflarestorage.com/profiles", Some(CDN)).unwrap()
}

fn url(name: &str) -> String {
    format!("{CDN}/matrimony/photos/{name}.jpg")
}

fn user() -> UserId {
    UserId::new("user-1").unwrap()
}

fn image(name: &str) -> CandidateFile {
    CandidateFile::new(name, Some("image/jpeg"), vec![0xFF, 0xD8, 0xFF])
}

async fn mount_with(
    record: Value,
    blobs: MemoryBlobStore,
) -> (Screen, MemoryRecordStore, MemoryBlobStore) {
    let records = MemoryRecordStore::new();
    records.insert(&user(), record);
    let screen = EditScreen::mount(user(), blobs.clone(), records.clone(), validator())
        .await
        .unwrap();
    (screen, records, blobs)
}

async fn mount(record: Value) -> (Screen, MemoryRecordStore, MemoryBlobStore) {
    mount_with(record, MemoryBlobStore::new(CDN)).await
}

fn completed(outcome: BatchOutcome) -> BatchReport {
    match outcome {
        BatchOutcome::Completed(report) => report,
        other => panic!("expected a completed batch, got {other:?}"),
    }
}

fn stored_photos(records: &MemoryRecordStore) -> Value {
    records.record(&user()).unwrap()["photos"].clone()
}

#[tokio::test]
async fn legacy_joined_string_loads_in_order() {
    let (screen, _, _) = mount(json!({ "photos": format!("{},{}", url("a"), url("b")) })).await;

    let snapshot = screen.snapshot();
    assert_eq!(snapshot.load, LoadStatus::Ready);
    assert_eq!(snapshot.user_images(), [url("a"), url("b")]);
}

#[tokio::test]
async fn invalid_list_entries_are_dropped_on_load() {
    let (screen, records, _) = mount(json!({ "photos": [url("a"), "not-a-storage-url"] })).await;

    assert_eq!(screen.snapshot().user_images(), [url("a")]);
    assert_eq!(
        stored_photos(&records),
        json!([url("a"), "not-a-storage-url"]),
        "the stored record is only rewritten by an explicit write"
    );
}

#[tokio::test]
async fn oversized_file_is_skipped_and_valid_sibling_uploads() {
    let (screen, records, _) = mount(json!({ "name": "Asha" })).await;
    let oversized = CandidateFile::new(
        "big.jpg",
        Some("image/jpeg"),
        vec![0; usize::try_from(MAX_FILE_SIZE_BYTES).unwrap() + 1],
    );

    let report = completed(
        screen
            .drop_files(AttachmentClass::Photos, vec![oversized, image("ok.jpg")])
            .await,
    );

    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(report.errors, vec!["big.jpg is larger than 5MB.".to_string()]);
    assert!(report.persisted);

    let snapshot = screen.snapshot();
    assert_eq!(snapshot.user_images(), report.uploaded.as_slice());
    assert_eq!(
        snapshot.errors().collect::<Vec<_>>(),
        vec!["big.jpg is larger than 5MB."]
    );
    assert_eq!(stored_photos(&records), json!(report.uploaded[0]));
    assert_eq!(records.record(&user()).unwrap()["name"], json!("Asha"));
}

#[tokio::test]
async fn two_biodata_files_in_one_batch_upload_nothing() {
    let (screen, records, blobs) = mount(json!({})).await;

    let outcome = screen
        .pick_files(
            AttachmentClass::Biodata,
            vec![image("one.jpg"), image("two.jpg")],
        )
        .await;

    assert_eq!(outcome, BatchOutcome::Rejected(BatchRejection::MultipleBiodata));
    assert_eq!(blobs.upload_attempts(), 0);
    assert!(records.patches().is_empty());
    let snapshot = screen.snapshot();
    assert_eq!(
        snapshot.errors().collect::<Vec<_>>(),
        vec!["Please select only one biodata image."]
    );
    assert_eq!(snapshot.lane(AttachmentClass::Biodata).phase, LanePhase::Idle);
    assert!(screen.controls_enabled(AttachmentClass::Biodata));
}

#[tokio::test]
async fn batch_over_photo_limit_is_rejected_whole() {
    let existing: Vec<String> = (0..9).map(|index| url(&index.to_string())).collect();
    let (screen, _, blobs) = mount(json!({ "photos": existing })).await;

    let outcome = screen
        .drop_files(AttachmentClass::Photos, vec![image("a.jpg"), image("b.jpg")])
        .await;

    assert_eq!(
        outcome,
        BatchOutcome::Rejected(BatchRejection::PhotoLimit { current: 9 })
    );
    assert_eq!(blobs.upload_attempts(), 0);
    let snapshot = screen.snapshot();
    assert_eq!(snapshot.user_images().len(), 9);
    assert!(snapshot
        .errors()
        .any(|error| error.contains("You currently have 9 photos.")));
}

#[tokio::test]
async fn transport_failure_skips_one_file_and_keeps_going() {
    let blobs = MemoryBlobStore::new(CDN).failing_upload(2);
    let (screen, records, blobs) = mount_with(json!({ "photos": url("old") }), blobs).await;

    let report = completed(
        screen
            .drop_files(
                AttachmentClass::Photos,
                vec![image("one.jpg"), image("two.jpg"), image("three.jpg")],
            )
            .await,
    );

    assert_eq!(blobs.upload_attempts(), 3);
    assert_eq!(report.uploaded.len(), 2);
    assert_eq!(report.errors, vec!["Failed to upload two.jpg.".to_string()]);
    assert!(report.persisted);

    let mut expected = vec![url("old")];
    expected.extend(report.uploaded.iter().cloned());
    assert_eq!(screen.snapshot().user_images(), expected.as_slice());
    assert_eq!(stored_photos(&records), json!(expected.join(",")));
}

#[tokio::test]
async fn batch_with_no_successful_upload_skips_persistence() {
    let blobs = MemoryBlobStore::new(CDN).failing_upload(1);
    let (screen, records, _) = mount_with(json!({}), blobs).await;

    let report = completed(
        screen
            .drop_files(AttachmentClass::Biodata, vec![image("bio.jpg")])
            .await,
    );

    assert!(report.uploaded.is_empty());
    assert!(!report.persisted);
    assert!(records.patches().is_empty());
    assert_eq!(
        screen.snapshot().errors().collect::<Vec<_>>(),
        vec!["Failed to upload bio.jpg."]
    );
}

#[tokio::test]
async fn biodata_upload_replaces_existing_image() {
    let old = format!("{CDN}/matrimony/bio/old.jpg");
    let (screen, records, blobs) = mount(json!({ "biodata": old })).await;

    let report = completed(
        screen
            .drop_files(AttachmentClass::Biodata, vec![image("new.jpg")])
            .await,
    );

    let new = report.uploaded[0].clone();
    assert_ne!(new, old);
    assert!(new.starts_with(&format!("{CDN}/matrimony/bio/")));
    assert_eq!(screen.snapshot().biodata_image(), Some(new.as_str()));
    assert_eq!(records.record(&user()).unwrap()["biodata"], json!(new));
    assert_eq!(blobs.keys().len(), 1);
}

#[tokio::test]
async fn removing_a_photo_persists_the_shorter_list() {
    let (screen, records, _) = mount(json!({ "photos": [url("a"), url("b"), url("c")] })).await;

    assert_eq!(screen.remove_photo(1).await, RemovalOutcome::Removed);

    assert_eq!(screen.snapshot().user_images(), [url("a"), url("c")]);
    assert_eq!(
        stored_photos(&records),
        json!(format!("{},{}", url("a"), url("c")))
    );
    assert_eq!(screen.remove_photo(5).await, RemovalOutcome::Missing);
}

#[tokio::test]
async fn removing_biodata_clears_the_field() {
    let bio = format!("{CDN}/matrimony/bio/b.jpg");
    let (screen, records, _) = mount(json!({ "biodata": bio, "name": "Asha" })).await;

    assert_eq!(screen.remove_biodata().await, RemovalOutcome::Removed);
    assert_eq!(screen.snapshot().biodata_image(), None);
    assert_eq!(records.record(&user()), Some(json!({ "name": "Asha" })));
    assert_eq!(screen.remove_biodata().await, RemovalOutcome::Missing);
}

#[tokio::test]
async fn failed_save_rolls_back_the_optimistic_value() {
    let (screen, records, blobs) = mount(json!({ "photos": [url("a")] })).await;
    records.set_fail_writes(true);

    let report = completed(
        screen
            .drop_files(AttachmentClass::Photos, vec![image("new.jpg")])
            .await,
    );
    assert_eq!(report.uploaded.len(), 1);
    assert!(!report.persisted);
    assert_eq!(blobs.keys().len(), 1);

    assert_eq!(screen.remove_photo(0).await, RemovalOutcome::Failed);

    let snapshot = screen.snapshot();
    assert_eq!(snapshot.user_images(), [url("a")]);
    assert!(snapshot.errors().all(|error| error == "Failed to save photos."));
    assert_eq!(snapshot.errors().count(), 2);
}

#[tokio::test]
async fn uploads_survive_a_reload() {
    let (screen, records, blobs) = mount(json!({})).await;
    let report = completed(
        screen
            .drop_files(
                AttachmentClass::Photos,
                vec![image("1.jpg"), image("2.png"), image("3.webp")],
            )
            .await,
    );

    let remounted = EditScreen::mount(user(), blobs, records, validator())
        .await
        .unwrap();
    assert_eq!(remounted.snapshot().user_images(), report.uploaded.as_slice());

    screen.reload().await.unwrap();
    assert_eq!(screen.snapshot().user_images(), report.uploaded.as_slice());
}

#[tokio::test]
async fn missing_record_fails_mount() {
    let result = EditScreen::mount(
        user(),
        MemoryBlobStore::new(CDN),
        MemoryRecordStore::new(),
        validator(),
    )
    .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn load_failure_disables_controls_until_reload() {
    let records = MemoryRecordStore::new();
    records.insert(&user(), json!({ "photos": url("a") }));
    records.set_fail_reads(true);
    let screen = EditScreen::mount(user(), MemoryBlobStore::new(CDN), records.clone(), validator())
        .await
        .unwrap();

    let snapshot = screen.snapshot();
    assert_eq!(snapshot.load, LoadStatus::Failed);
    assert_eq!(
        snapshot.errors().collect::<Vec<_>>(),
        vec!["Failed to load user data."]
    );
    assert!(!screen.controls_enabled(AttachmentClass::Photos));
    assert_eq!(
        screen
            .drop_files(AttachmentClass::Photos, vec![image("x.jpg")])
            .await,
        BatchOutcome::Busy
    );
    assert_eq!(screen.remove_photo(0).await, RemovalOutcome::Busy);

    records.set_fail_reads(false);
    screen.reload().await.unwrap();
    assert_eq!(screen.snapshot().load, LoadStatus::Ready);
    assert_eq!(screen.snapshot().user_images(), [url("a")]);
}

#[tokio::test(start_paused = true)]
async fn busy_lane_refuses_new_batches_and_removals() {
    let blobs = MemoryBlobStore::new(CDN).with_latency(Duration::from_millis(200));
    let (screen, _, _) = mount_with(json!({ "photos": [url("a")] }), blobs).await;

    let upload = screen.drop_files(AttachmentClass::Photos, vec![image("slow.jpg")]);
    let interleaved = async {
        let snapshot = screen.snapshot();
        assert!(snapshot.lane(AttachmentClass::Photos).is_busy());
        assert!(screen.controls_enabled(AttachmentClass::Biodata));
        (
            screen.remove_photo(0).await,
            screen
                .pick_files(AttachmentClass::Photos, vec![image("other.jpg")])
                .await,
        )
    };
    let (outcome, (removal, second)) = tokio::join!(upload, interleaved);

    assert!(completed(outcome).persisted);
    assert_eq!(removal, RemovalOutcome::Busy);
    assert_eq!(second, BatchOutcome::Busy);
    assert_eq!(screen.snapshot().user_images().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn lanes_for_both_classes_run_side_by_side() {
    let blobs = MemoryBlobStore::new(CDN).with_latency(Duration::from_millis(50));
    let (screen, records, _) = mount_with(json!({}), blobs).await;

    let (bio, photos) = tokio::join!(
        screen.drop_files(AttachmentClass::Biodata, vec![image("bio.jpg")]),
        screen.drop_files(
            AttachmentClass::Photos,
            vec![image("p1.jpg"), image("p2.jpg")]
        ),
    );
    let bio = completed(bio);
    let photos = completed(photos);
    assert!(bio.persisted && photos.persisted);

    let record = records.record(&user()).unwrap();
    assert_eq!(record["biodata"], json!(bio.uploaded[0]));
    assert_eq!(record["photos"], json!(photos.uploaded.join(",")));
}

#[tokio::test(start_paused = true)]
async fn progress_and_messages_clear_after_their_windows() {
    let (screen, _, _) = mount(json!({})).await;
    let report = completed(
        screen
            .drop_files(
                AttachmentClass::Photos,
                vec![image("a.jpg"), CandidateFile::new("notes.txt", None, vec![1])],
            )
            .await,
    );
    assert_eq!(report.errors, vec!["notes.txt is not an image file.".to_string()]);

    let snapshot = screen.snapshot();
    let lane = snapshot.lane(AttachmentClass::Photos);
    assert_eq!(lane.phase, LanePhase::Idle);
    assert_eq!(lane.progress, 100);
    assert_eq!(lane.current_file_name, "a.jpg");
    assert_eq!(snapshot.status_message(), Some("Photos saved."));

    tokio::time::advance(PROGRESS_RESET_DELAY).await;
    assert_eq!(screen.snapshot().lane(AttachmentClass::Photos).progress, 0);

    tokio::time::advance(ERROR_DISPLAY).await;
    let snapshot = screen.snapshot();
    assert_eq!(snapshot.errors().count(), 0);
    assert_eq!(snapshot.status_message(), None);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_errors_clear_without_reading_snapshots() {
    let (screen, _, _) = mount(json!({})).await;
    screen
        .pick_files(
            AttachmentClass::Biodata,
            vec![image("one.jpg"), image("two.jpg")],
        )
        .await;
    let shown_at = Instant::now();
    let mut changes = screen.subscribe();
    assert_eq!(
        changes.borrow_and_update().errors().collect::<Vec<_>>(),
        vec!["Please select only one biodata image."]
    );

    let cleared = tokio::time::timeout(Duration::from_secs(15), async {
        loop {
            changes.changed().await.unwrap();
            if changes.borrow_and_update().errors().count() == 0 {
                break;
            }
        }
    })
    .await;

    assert!(cleared.is_ok());
    assert!(Instant::now() >= shown_at + ERROR_DISPLAY);
}

#[tokio::test(start_paused = true)]
async fn photos_upload_one_at_a_time_and_publish_progress_per_file() {
    let blobs = MemoryBlobStore::new(CDN).with_latency(Duration::from_millis(100));
    let (screen, _, blobs) = mount_with(json!({}), blobs).await;
    let mut changes = screen.subscribe();

    let upload = screen.drop_files(
        AttachmentClass::Photos,
        vec![image("1.jpg"), image("2.jpg"), image("3.jpg")],
    );
    let observe = async {
        let mut seen = Vec::new();
        while changes.changed().await.is_ok() {
            let progress = changes
                .borrow_and_update()
                .lane(AttachmentClass::Photos)
                .progress;
            if progress > 0 && seen.last() != Some(&progress) {
                seen.push(progress);
            }
            if progress == 100 {
                break;
            }
        }
        seen
    };
    let (outcome, seen) = tokio::join!(upload, observe);

    assert_eq!(completed(outcome).uploaded.len(), 3);
    assert_eq!(seen, vec![33, 67, 100]);
    assert_eq!(blobs.upload_attempts(), 3);
    assert_eq!(blobs.peak_concurrent_uploads(), 1);
}

#[tokio::test]
async fn drag_flags_are_visual_only() {
    let (screen, records, _) = mount(json!({})).await;

    screen.drag_enter(AttachmentClass::Photos);
    assert!(screen.snapshot().lane(AttachmentClass::Photos).drag_over);
    assert!(!screen.snapshot().lane(AttachmentClass::Biodata).drag_over);
    screen.drag_leave(AttachmentClass::Photos);
    assert!(!screen.snapshot().lane(AttachmentClass::Photos).drag_over);

    screen.drag_enter(AttachmentClass::Biodata);
    let outcome = screen.drop_files(AttachmentClass::Biodata, Vec::new()).await;
    assert_eq!(outcome, BatchOutcome::Empty);
    assert!(!screen.snapshot().lane(AttachmentClass::Biodata).drag_over);
    assert!(records.patches().is_empty());
}

#[tokio::test]
async fn uploaded_objects_land_in_class_namespaces() {
    let (screen, _, blobs) = mount(json!({})).await;
    screen
        .drop_files(AttachmentClass::Biodata, vec![image("My Biodata.JPG")])
        .await;
    screen
        .drop_files(AttachmentClass::Photos, vec![image("holiday.png")])
        .await;

    let keys = blobs.keys();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().any(|key| key.starts_with("matrimony/bio/") && key.ends_with(".jpg")));
    assert!(keys
        .iter()
        .any(|key| key.starts_with("matrimony/photos/") && key.ends_with(".png")));
    assert!(keys.iter().all(|key| !key.contains("holiday") && !key.contains("biodata")));
}
