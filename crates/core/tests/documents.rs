mod common;

use bytes::Bytes;
use uuid::Uuid;

use common::{harness, identity, pdf_upload, set};
use folio_core::document::validate::{ValidationError, MAX_TITLE_LEN};
use folio_core::events::DocumentEvent;
use folio_core::services::{DocumentUpdate, UploadRequest};
use folio_core::store::RecordStore;
use folio_core::Error;

#[tokio::test]
async fn upload_stores_blob_and_record() {
    let h = harness();
    let ann = identity("ann@example.com");
    let mut events = h.events.subscribe();

    let doc = h.upload(&ann, "Quarterly Report.pdf").await;

    assert_eq!(doc.title, "Quarterly Report.pdf");
    assert_eq!(doc.owner_id, ann.id);
    assert!(!doc.is_public);
    assert_eq!(doc.mime_type, "application/pdf");
    assert!(doc.blob_path.as_str().starts_with(&format!("{}/", ann.id)));
    assert!(doc.blob_path.as_str().ends_with("-QuarterlyReport.pdf"));
    assert!(h.blobs.inner.contains(&doc.blob_path).await);
    assert_eq!(
        h.blobs.inner.content_type(&doc.blob_path).await.as_deref(),
        Some("application/pdf")
    );

    let stored = h.records.get_document(doc.id).await.unwrap().unwrap();
    assert_eq!(stored, doc);
    assert!(matches!(events.try_recv(), Ok(DocumentEvent::Uploaded(_))));
}

#[tokio::test]
async fn explicit_title_wins_over_filename() {
    let h = harness();
    let ann = identity("ann@example.com");
    let request = UploadRequest {
        title: Some("  Board minutes ".into()),
        is_public: true,
        ..pdf_upload("minutes.pdf")
    };
    let doc = h.services.upload.upload(Some(&ann), request).await.unwrap();
    assert_eq!(doc.title, "Board minutes");
    assert!(doc.is_public);
}

#[tokio::test]
async fn long_filename_upload_gets_a_truncated_title() {
    let h = harness();
    let ann = identity("ann@example.com");
    let filename = format!("{}.pdf", "a".repeat(300));

    let doc = h.upload(&ann, &filename).await;

    assert_eq!(doc.title.chars().count(), MAX_TITLE_LEN);
    assert!(doc.title.starts_with("aaaa"));
    assert_eq!(doc.original_name, filename);
    assert!(doc.blob_path.as_str().ends_with(".pdf"));
    assert!(h.blobs.inner.contains(&doc.blob_path).await);
}

#[tokio::test]
async fn unnamed_upload_falls_back_to_a_default_title() {
    let h = harness();
    let ann = identity("ann@example.com");

    let doc = h.upload(&ann, "").await;

    assert_eq!(doc.title, "document.pdf");
    assert!(doc.blob_path.as_str().ends_with("-document.pdf"));
}

#[tokio::test]
async fn rejected_uploads_leave_no_trace() {
    let h = harness();
    let ann = identity("ann@example.com");

    let cases = vec![
        UploadRequest {
            declared_mime: "image/png".into(),
            ..pdf_upload("photo.png")
        },
        UploadRequest {
            data: Bytes::new(),
            ..pdf_upload("empty.pdf")
        },
        UploadRequest {
            data: Bytes::from(vec![0u8; 10 * 1024 * 1024 + 1]),
            ..pdf_upload("huge.pdf")
        },
    ];
    for request in cases {
        let err = h
            .services
            .upload
            .upload(Some(&ann), request)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "unexpected {err:?}");
    }

    let err = h
        .services
        .upload
        .upload(None, pdf_upload("anon.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthenticated));

    assert!(h.blobs.inner.is_empty().await);
    assert!(h.records.list_visible_documents(Some(ann.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn wrong_type_is_reported_before_size() {
    let h = harness();
    let ann = identity("ann@example.com");
    let request = UploadRequest {
        declared_mime: "text/plain".into(),
        data: Bytes::new(),
        ..pdf_upload("notes.txt")
    };
    let err = h.services.upload.upload(Some(&ann), request).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::InvalidFileType { .. })
    ));
}

#[tokio::test]
async fn failed_insert_removes_the_blob() {
    let h = harness();
    let ann = identity("ann@example.com");
    set(&h.records.fail_insert_document, true);

    let err = h
        .services
        .upload
        .upload(Some(&ann), pdf_upload("report.pdf"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert!(h.blobs.inner.is_empty().await);
}

#[tokio::test]
async fn failed_cleanup_is_reported_with_the_insert_error() {
    let h = harness();
    let ann = identity("ann@example.com");
    set(&h.records.fail_insert_document, true);
    set(&h.blobs.fail_delete, true);

    let err = h
        .services
        .upload
        .upload(Some(&ann), pdf_upload("report.pdf"))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert!(message.contains("injected insert failure"), "{message}");
    assert!(message.contains("cleanup of blob"), "{message}");
    assert_eq!(h.blobs.inner.len().await, 1);
}

#[tokio::test]
async fn failed_blob_put_writes_no_record() {
    let h = harness();
    let ann = identity("ann@example.com");
    set(&h.blobs.fail_put, true);

    let err = h
        .services
        .upload
        .upload(Some(&ann), pdf_upload("report.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert!(h.records.list_visible_documents(Some(ann.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn private_documents_are_gated() {
    let h = harness();
    let ann = identity("ann@example.com");
    let bob = identity("bob@example.com");
    let doc = h.upload(&ann, "private.pdf").await;

    assert_eq!(h.services.access.get(Some(&ann), doc.id).await.unwrap().id, doc.id);
    assert!(matches!(
        h.services.access.get(Some(&bob), doc.id).await,
        Err(Error::Unauthorized(_))
    ));
    assert!(matches!(
        h.services.access.get(None, doc.id).await,
        Err(Error::Unauthorized(_))
    ));
    assert!(matches!(
        h.services.access.read_content(Some(&bob), doc.id).await,
        Err(Error::Unauthorized(_))
    ));

    let (_, data) = h.services.access.read_content(Some(&ann), doc.id).await.unwrap();
    assert_eq!(data, common::pdf_bytes());
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let h = harness();
    let ann = identity("ann@example.com");
    assert!(matches!(
        h.services.access.get(Some(&ann), Uuid::new_v4()).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        h.services.access.delete(Some(&ann), Uuid::new_v4()).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn listing_shows_public_and_own_documents() {
    let h = harness();
    let ann = identity("ann@example.com");
    let bob = identity("bob@example.com");
    let mine = h.upload(&ann, "mine.pdf").await;
    let theirs_private = h.upload(&bob, "bob-private.pdf").await;
    let theirs_public = h
        .services
        .upload
        .upload(
            Some(&bob),
            UploadRequest {
                is_public: true,
                ..pdf_upload("bob-public.pdf")
            },
        )
        .await
        .unwrap();

    let ids: Vec<Uuid> = h
        .services
        .access
        .list(Some(&ann))
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert!(ids.contains(&mine.id));
    assert!(ids.contains(&theirs_public.id));
    assert!(!ids.contains(&theirs_private.id));

    let anonymous: Vec<Uuid> = h
        .services
        .access
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(anonymous, vec![theirs_public.id]);
}

#[tokio::test]
async fn only_the_owner_may_update() {
    let h = harness();
    let ann = identity("ann@example.com");
    let bob = identity("bob@example.com");
    let doc = h.upload(&ann, "draft.pdf").await;

    let rename = || DocumentUpdate {
        title: Some("Final".into()),
        ..DocumentUpdate::default()
    };
    assert!(matches!(
        h.services.access.update(Some(&bob), doc.id, rename()).await,
        Err(Error::Forbidden(_))
    ));
    assert!(matches!(
        h.services.access.update(None, doc.id, rename()).await,
        Err(Error::Unauthenticated)
    ));

    let updated = h.services.access.update(Some(&ann), doc.id, rename()).await.unwrap();
    assert_eq!(updated.title, "Final");

    let unchanged = h
        .services
        .access
        .update(Some(&ann), doc.id, DocumentUpdate::default())
        .await
        .unwrap();
    assert_eq!(unchanged.title, "Final");

    assert!(matches!(
        h.services
            .access
            .update(
                Some(&ann),
                doc.id,
                DocumentUpdate {
                    title: Some("   ".into()),
                    ..DocumentUpdate::default()
                },
            )
            .await,
        Err(Error::Validation(ValidationError::EmptyTitle))
    ));
}

#[tokio::test]
async fn title_and_visibility_change_together() {
    let h = harness();
    let ann = identity("ann@example.com");
    let doc = h.upload(&ann, "draft.pdf").await;
    let mut events = h.events.subscribe();

    let updated = h
        .services
        .access
        .update(
            Some(&ann),
            doc.id,
            DocumentUpdate {
                title: Some("Final".into()),
                is_public: Some(true),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Final");
    assert!(updated.is_public);
    assert!(matches!(events.try_recv(), Ok(DocumentEvent::Updated(_))));
    assert!(matches!(
        events.try_recv(),
        Ok(DocumentEvent::VisibilityChanged { is_public: true, .. })
    ));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn failed_update_changes_neither_field() {
    let h = harness();
    let ann = identity("ann@example.com");
    let doc = h.upload(&ann, "draft.pdf").await;
    set(&h.records.fail_update_document, true);

    let result = h
        .services
        .access
        .update(
            Some(&ann),
            doc.id,
            DocumentUpdate {
                title: Some("Final".into()),
                is_public: Some(true),
            },
        )
        .await;
    assert!(matches!(result, Err(Error::StoreUnavailable(_))));

    let stored = h.records.get_document(doc.id).await.unwrap().unwrap();
    assert_eq!(stored.title, doc.title);
    assert!(!stored.is_public);
}

#[tokio::test]
async fn setting_current_visibility_writes_nothing() {
    let h = harness();
    let ann = identity("ann@example.com");
    let doc = h.upload(&ann, "draft.pdf").await;
    let mut events = h.events.subscribe();
    set(&h.records.fail_update_document, true);

    let unchanged = h
        .services
        .access
        .update(
            Some(&ann),
            doc.id,
            DocumentUpdate {
                is_public: Some(false),
                ..DocumentUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(!unchanged.is_public);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn delete_removes_blob_record_and_comments() {
    let h = harness();
    let ann = identity("ann@example.com");
    let doc = h.upload(&ann, "gone.pdf").await;
    h.services
        .comments
        .add(Some(&ann), doc.id, 1, "first")
        .await
        .unwrap();

    h.services.access.delete(Some(&ann), doc.id).await.unwrap();

    assert!(!h.blobs.inner.contains(&doc.blob_path).await);
    assert!(h.records.get_document(doc.id).await.unwrap().is_none());
    assert_eq!(h.records.inner.comment_count().await, 0);
}

#[tokio::test]
async fn non_owner_delete_is_forbidden_and_harmless() {
    let h = harness();
    let ann = identity("ann@example.com");
    let bob = identity("bob@example.com");
    let doc = h
        .services
        .upload
        .upload(
            Some(&ann),
            UploadRequest {
                is_public: true,
                ..pdf_upload("shared.pdf")
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        h.services.access.delete(Some(&bob), doc.id).await,
        Err(Error::Forbidden(_))
    ));
    assert!(h.blobs.inner.contains(&doc.blob_path).await);
    assert!(h.records.get_document(doc.id).await.unwrap().is_some());
}

#[tokio::test]
async fn failed_blob_delete_keeps_the_record() {
    let h = harness();
    let ann = identity("ann@example.com");
    let doc = h.upload(&ann, "sticky.pdf").await;
    set(&h.blobs.fail_delete, true);

    let err = h.services.access.delete(Some(&ann), doc.id).await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert!(h.records.get_document(doc.id).await.unwrap().is_some());
    assert!(h.blobs.inner.contains(&doc.blob_path).await);
}

#[tokio::test]
async fn failed_record_delete_is_reported() {
    let h = harness();
    let ann = identity("ann@example.com");
    let doc = h.upload(&ann, "half.pdf").await;
    set(&h.records.fail_delete_document, true);

    let err = h.services.access.delete(Some(&ann), doc.id).await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert!(!h.blobs.inner.contains(&doc.blob_path).await);

    set(&h.records.fail_delete_document, false);
    h.services.access.delete(Some(&ann), doc.id).await.unwrap();
    assert!(h.records.get_document(doc.id).await.unwrap().is_none());
}
