use super::*;

fn person(id: i64, local: i64, username: &str, role: &str) -> Person {
    Person {
        person_id: PersonId(id),
        local_site_id: LocalSiteId(local),
        site_id: SiteId(9000 + local),
        username: username.to_string(),
        display_name: username.to_uppercase(),
        role: role.to_string(),
        avatar_url: None,
    }
}

async fn storage_with_site(local: i64) -> Storage {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .upsert_site(&Site {
            local_id: LocalSiteId(local),
            site_id: Some(SiteId(9000 + local)),
            name: "blog".into(),
            url: "https://blog.example".into(),
            people_synced_at: None,
        })
        .await
        .expect("site");
    storage
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("people_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("storage.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn upserts_and_reads_sites() {
    let storage = storage_with_site(1).await;
    storage
        .upsert_site(&Site {
            local_id: LocalSiteId(2),
            site_id: None,
            name: "self hosted".into(),
            url: "https://self.example".into(),
            people_synced_at: None,
        })
        .await
        .expect("second site");

    let site = storage
        .site(LocalSiteId(2))
        .await
        .expect("lookup")
        .expect("site exists");
    assert_eq!(site.site_id, None);
    assert_eq!(storage.list_sites().await.expect("sites").len(), 2);
    assert!(storage.site(LocalSiteId(3)).await.expect("lookup").is_none());
}

#[tokio::test]
async fn save_people_replaces_the_whole_list_for_a_site() {
    let storage = storage_with_site(1).await;
    storage
        .save_people(
            &[person(1, 1, "alice", "administrator"), person(2, 1, "bob", "editor")],
            LocalSiteId(1),
        )
        .await
        .expect("first save");

    storage
        .save_people(&[person(2, 1, "bob", "author"), person(3, 1, "carol", "contributor")], LocalSiteId(1))
        .await
        .expect("second save");

    let people = storage.list_people(LocalSiteId(1)).await.expect("list");
    let ids: Vec<i64> = people.iter().map(|p| p.person_id.0).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(people[0].role, "author");
}

#[tokio::test]
async fn save_people_leaves_other_sites_untouched() {
    let storage = storage_with_site(1).await;
    storage
        .save_people(&[person(1, 2, "dave", "editor")], LocalSiteId(2))
        .await
        .expect("site two");
    storage
        .save_people(&[], LocalSiteId(1))
        .await
        .expect("empty site one");

    assert_eq!(storage.list_people(LocalSiteId(2)).await.expect("list").len(), 1);
    assert!(storage.list_people(LocalSiteId(1)).await.expect("list").is_empty());
}

#[tokio::test]
async fn save_people_records_sync_time() {
    let storage = storage_with_site(1).await;
    assert!(storage
        .people_synced_at(LocalSiteId(1))
        .await
        .expect("synced at")
        .is_none());

    storage
        .save_people(&[person(1, 1, "alice", "administrator")], LocalSiteId(1))
        .await
        .expect("save");

    assert!(storage
        .people_synced_at(LocalSiteId(1))
        .await
        .expect("synced at")
        .is_some());
}

#[tokio::test]
async fn save_person_updates_role_in_place() {
    let storage = storage_with_site(1).await;
    storage
        .save_people(&[person(1, 1, "alice", "editor")], LocalSiteId(1))
        .await
        .expect("save");

    storage
        .save_person(&person(1, 1, "alice", "administrator"))
        .await
        .expect("update");

    let stored = storage
        .person(PersonId(1), LocalSiteId(1))
        .await
        .expect("lookup")
        .expect("present");
    assert_eq!(stored.role, "administrator");
}

#[tokio::test]
async fn delete_person_removes_only_that_record() {
    let storage = storage_with_site(1).await;
    storage
        .save_people(&[person(1, 1, "alice", "editor"), person(2, 1, "bob", "author")], LocalSiteId(1))
        .await
        .expect("save");

    storage
        .delete_person(PersonId(1), LocalSiteId(1))
        .await
        .expect("delete");
    storage
        .delete_person(PersonId(42), LocalSiteId(1))
        .await
        .expect("deleting a missing record is fine");

    assert!(storage
        .person(PersonId(1), LocalSiteId(1))
        .await
        .expect("lookup")
        .is_none());
    assert!(storage
        .person(PersonId(2), LocalSiteId(1))
        .await
        .expect("lookup")
        .is_some());
}

#[test]
fn memory_urls_have_no_backing_path() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/people.db?mode=rwc"),
        Some(PathBuf::from("./data/people.db"))
    );
}
