use chrono::NaiveDate;
use personnel_core::{
    EmployeeId, EmployeeUpdate, InMemoryPersonnelRepository, JournalEntry, PersonnelRegistry,
    PersonnelRepository, RegistryConfig, RegistryError, RepoError,
};

type Registry = PersonnelRegistry<InMemoryPersonnelRepository>;

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

fn fresh_registry() -> Registry {
    PersonnelRegistry::bootstrap(InMemoryPersonnelRepository::new(), &RegistryConfig::default())
        .unwrap()
}

fn add_member(registry: &mut Registry, league: &str, last: &str, email: &str) -> EmployeeId {
    let league_id = registry.league_by_name(league).unwrap().id();
    registry
        .league_mut(league_id)
        .unwrap()
        .add_employee(last, "Jane", email, "pw", Some(date("2024-01-10")), None)
        .unwrap()
        .id()
}

#[test]
fn bootstrap_creates_single_root_with_well_known_credentials() {
    let registry = fresh_registry();

    let root = registry.root();
    assert!(root.is_root());
    assert_eq!(root.email(), "root");
    assert!(root.check_password("toor"));
    assert!(root.league().is_none());
    assert_eq!(registry.employee_count(), 1);
    assert_eq!(registry.repository().employee_count(), 1);
}

#[test]
fn bootstrap_adopts_existing_root() {
    let first = fresh_registry();
    let root_id = first.root().id();
    let repo = first.repository().clone();

    let second = PersonnelRegistry::bootstrap(repo, &RegistryConfig::default()).unwrap();
    assert_eq!(second.root().id(), root_id);
    assert_eq!(second.repository().employee_count(), 1);
    assert_eq!(
        second
            .employees()
            .iter()
            .filter(|employee| employee.is_root())
            .count(),
        1
    );
}

#[test]
fn new_league_is_administered_by_root() {
    let mut registry = fresh_registry();
    let root_id = registry.root().id();

    let league_id = registry.add_league("Darts").unwrap().id();

    let league = registry.league(league_id).unwrap();
    assert_eq!(league.name(), "Darts");
    assert_eq!(league.administrator(), Some(root_id));
    assert!(registry.root().is_administrator_of(league));
}

#[test]
fn member_can_be_made_administrator() {
    let mut registry = fresh_registry();
    let league_id = registry.add_league("Darts").unwrap().id();

    let jane = registry
        .league_mut(league_id)
        .unwrap()
        .add_employee("Doe", "Jane", "jane@x.com", "pw", Some(date("2024-01-10")), None)
        .unwrap();
    assert_eq!(jane.league(), Some(league_id));

    registry
        .league_mut(league_id)
        .unwrap()
        .set_administrator(jane.id())
        .unwrap();

    let league = registry.league(league_id).unwrap();
    assert_eq!(league.administrator(), Some(jane.id()));
    assert!(registry.employee(jane.id()).unwrap().is_administrator_of(league));
    assert!(registry
        .employee_mut(jane.id())
        .unwrap()
        .is_administrator_of(league_id));
}

#[test]
fn duplicate_league_name_is_rejected_before_write() {
    let mut registry = fresh_registry();
    registry.add_league("Darts").unwrap();
    registry.repository_mut().clear_journal();

    let err = registry.add_league("  Darts ").err().unwrap();
    assert!(matches!(err, RegistryError::DuplicateName(name) if name == "Darts"));
    assert_eq!(
        registry
            .leagues()
            .iter()
            .filter(|league| league.name() == "Darts")
            .count(),
        1
    );
    assert!(registry.repository().journal().is_empty());
}

#[test]
fn blank_league_name_is_rejected() {
    let mut registry = fresh_registry();
    let err = registry.add_league("   ").err().unwrap();
    assert!(matches!(err, RegistryError::EmptyName { .. }));
}

#[test]
fn rename_checks_uniqueness_against_other_leagues() {
    let mut registry = fresh_registry();
    let darts = registry.add_league("Darts").unwrap().id();
    registry.add_league("Chess").unwrap();

    let err = registry.league_mut(darts).unwrap().set_name("Chess").unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateName(_)));

    registry.league_mut(darts).unwrap().set_name("Pool").unwrap();
    let names: Vec<&str> = registry.leagues().iter().map(|league| league.name()).collect();
    assert_eq!(names, vec!["Chess", "Pool"]);
}

#[test]
fn outsider_cannot_administer_league() {
    let mut registry = fresh_registry();
    let darts = registry.add_league("Darts").unwrap().id();
    registry.add_league("Chess").unwrap();
    let bob = add_member(&mut registry, "Chess", "Smith", "bob@x.com");

    let err = registry
        .league_mut(darts)
        .unwrap()
        .set_administrator(bob)
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InsufficientRights { employee, league } if employee == bob && league == darts
    ));
    assert_eq!(
        registry.league(darts).unwrap().administrator(),
        Some(registry.root().id())
    );
}

#[test]
fn duplicate_email_is_rejected_registry_wide() {
    let mut registry = fresh_registry();
    registry.add_league("Darts").unwrap();
    let chess = registry.add_league("Chess").unwrap().id();
    add_member(&mut registry, "Darts", "Doe", "jane@x.com");

    let err = registry
        .league_mut(chess)
        .unwrap()
        .add_employee("Roe", "Jane", "JANE@x.com", "pw", None, None)
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateEmail(_)));
    assert!(registry.league(chess).unwrap().is_empty());
}

#[test]
fn member_fields_are_validated() {
    let mut registry = fresh_registry();
    let darts = registry.add_league("Darts").unwrap().id();
    let mut league = registry.league_mut(darts).unwrap();

    assert!(matches!(
        league.add_employee(" ", "Jane", "jane@x.com", "pw", None, None),
        Err(RegistryError::EmptyName { field: "last name" })
    ));
    assert!(matches!(
        league.add_employee("Doe", "Jane", "not-an-email", "pw", None, None),
        Err(RegistryError::InvalidEmail(_))
    ));
    assert!(matches!(
        league.add_employee("Doe", "Jane", "jane@x.com", "", None, None),
        Err(RegistryError::EmptyPassword)
    ));
    assert!(matches!(
        league.add_employee("Doe", "Jane", "jane@x.com", "   ", None, None),
        Err(RegistryError::EmptyPassword)
    ));
    assert!(matches!(
        league.add_employee(
            "Doe",
            "Jane",
            "jane@x.com",
            "pw",
            Some(date("2024-03-15")),
            Some(date("2024-03-01"))
        ),
        Err(RegistryError::InconsistentDate { .. })
    ));
    assert!(matches!(
        league.add_employee("Doe", "Jane", "jane@x.com", "pw", Some(date("2999-01-01")), None),
        Err(RegistryError::InvalidDate { .. })
    ));
    assert!(league.league().unwrap().is_empty());
}

#[test]
fn omitted_arrival_defaults_to_today() {
    let mut registry = fresh_registry();
    let darts = registry.add_league("Darts").unwrap().id();
    let jane = registry
        .league_mut(darts)
        .unwrap()
        .add_employee("Doe", "Jane", "jane@x.com", "pw", None, None)
        .unwrap();
    assert_eq!(
        jane.arrival_date(),
        Some(chrono::Local::now().date_naive())
    );
}

#[test]
fn tenure_updates_keep_ordering() {
    let mut registry = fresh_registry();
    registry.add_league("Darts").unwrap();
    let jane = add_member(&mut registry, "Darts", "Doe", "jane@x.com");
    let mut handle = registry.employee_mut(jane).unwrap();

    handle.set_departure_date(Some(date("2024-06-30"))).unwrap();
    assert!(matches!(
        handle.set_arrival_date(date("2024-07-01")),
        Err(RegistryError::InconsistentDate { .. })
    ));
    assert!(matches!(
        handle.set_departure_date(Some(date("2024-01-09"))),
        Err(RegistryError::InconsistentDate { .. })
    ));
    assert!(matches!(
        handle.set_arrival_date(date("2999-01-01")),
        Err(RegistryError::InvalidDate { .. })
    ));

    handle
        .apply(
            EmployeeUpdate::default()
                .arrival_date(date("2024-08-01"))
                .departure_date(None),
        )
        .unwrap();

    let employee = registry.employee(jane).unwrap();
    assert_eq!(employee.arrival_date(), Some(date("2024-08-01")));
    assert_eq!(employee.departure_date(), None);
}

#[test]
fn batched_update_writes_once() {
    let mut registry = fresh_registry();
    registry.add_league("Darts").unwrap();
    let jane = add_member(&mut registry, "Darts", "Doe", "jane@x.com");
    registry.repository_mut().clear_journal();

    registry
        .employee_mut(jane)
        .unwrap()
        .apply(
            EmployeeUpdate::default()
                .last_name("Smith")
                .first_name("Janet")
                .email("janet@x.com"),
        )
        .unwrap();

    assert_eq!(
        registry.repository().journal(),
        &[JournalEntry::UpdateEmployee(jane)]
    );
    let employee = registry.employee_by_email("JANET@x.com").unwrap();
    assert_eq!(employee.last_name(), "Smith");
    assert_eq!(employee.first_name(), "Janet");
}

#[test]
fn email_change_must_stay_unique() {
    let mut registry = fresh_registry();
    registry.add_league("Darts").unwrap();
    let jane = add_member(&mut registry, "Darts", "Doe", "jane@x.com");
    add_member(&mut registry, "Darts", "Roe", "rick@x.com");

    let err = registry
        .employee_mut(jane)
        .unwrap()
        .set_email("rick@x.com")
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateEmail(_)));

    registry
        .employee_mut(jane)
        .unwrap()
        .set_email("Jane@X.com")
        .unwrap();
    assert_eq!(registry.employee(jane).unwrap().email(), "Jane@X.com");
}

#[test]
fn root_profile_is_editable() {
    let mut registry = fresh_registry();
    let root_id = registry.root().id();

    let mut handle = registry.employee_mut(root_id).unwrap();
    assert!(handle.is_root());
    handle.set_password("n3w-secret").unwrap();
    handle.set_first_name("Admin").unwrap();

    assert_eq!(registry.root().first_name(), "Admin");
    assert!(registry.authenticate("root", "n3w-secret").is_ok());
    assert!(registry.authenticate("root", "toor").is_err());
}

#[test]
fn members_are_listed_in_name_order() {
    let mut registry = fresh_registry();
    registry.add_league("Darts").unwrap();
    add_member(&mut registry, "Darts", "Martin", "martin@x.com");
    add_member(&mut registry, "Darts", "Doe", "doe@x.com");
    add_member(&mut registry, "Darts", "Doe", "doe2@x.com");

    let league = registry.league_by_name("Darts").unwrap();
    let names: Vec<&str> = league.members().iter().map(|m| m.last_name()).collect();
    assert_eq!(names, vec!["Doe", "Doe", "Martin"]);

    let everyone = registry.employees();
    assert!(everyone[0].is_root());
    assert_eq!(everyone.len(), 4);
}

#[test]
fn removing_root_fails_and_changes_nothing() {
    let mut registry = fresh_registry();
    let root_id = registry.root().id();
    registry.repository_mut().clear_journal();

    let err = registry.remove_employee(root_id).unwrap_err();
    assert!(matches!(err, RegistryError::CannotDeleteRoot));
    assert_eq!(registry.root().id(), root_id);
    assert!(registry.repository().journal().is_empty());
}

#[test]
fn removing_administrator_reassigns_root_before_delete() {
    let mut registry = fresh_registry();
    let root_id = registry.root().id();
    let darts = registry.add_league("Darts").unwrap().id();
    let jane = add_member(&mut registry, "Darts", "Doe", "jane@x.com");
    registry.league_mut(darts).unwrap().set_administrator(jane).unwrap();
    registry.repository_mut().clear_journal();

    registry.remove_employee(jane).unwrap();

    assert_eq!(
        registry.repository().journal(),
        &[
            JournalEntry::UpdateLeague {
                id: darts,
                administrator: Some(root_id),
            },
            JournalEntry::DeleteEmployee(jane),
        ]
    );
    let league = registry.league(darts).unwrap();
    assert_eq!(league.administrator(), Some(root_id));
    assert!(!league.contains(jane));
    assert!(registry.employee(jane).is_none());
}

#[test]
fn removing_league_drains_members_first() {
    let mut registry = fresh_registry();
    let root_id = registry.root().id();
    let darts = registry.add_league("Darts").unwrap().id();
    let jane = add_member(&mut registry, "Darts", "Doe", "jane@x.com");
    let rick = add_member(&mut registry, "Darts", "Roe", "rick@x.com");
    registry.league_mut(darts).unwrap().set_administrator(rick).unwrap();
    registry.repository_mut().clear_journal();

    registry.remove_league(darts).unwrap();

    assert_eq!(
        registry.repository().journal(),
        &[
            JournalEntry::DeleteEmployee(jane),
            JournalEntry::UpdateLeague {
                id: darts,
                administrator: Some(root_id),
            },
            JournalEntry::DeleteEmployee(rick),
            JournalEntry::DeleteLeague(darts),
        ]
    );
    assert!(registry.league(darts).is_none());
    assert_eq!(registry.employee_count(), 1);
    assert_eq!(registry.repository().league_count(), 0);
}

#[test]
fn failed_write_leaves_registry_unchanged() {
    let mut registry = fresh_registry();
    let darts = registry.add_league("Darts").unwrap().id();
    let jane = add_member(&mut registry, "Darts", "Doe", "jane@x.com");
    registry.league_mut(darts).unwrap().set_administrator(jane).unwrap();

    registry.repository_mut().fail_next_write("disk full");
    let err = registry.add_league("Chess").err().unwrap();
    assert!(matches!(
        err,
        RegistryError::Persistence(RepoError::Unavailable(ref reason)) if reason == "disk full"
    ));
    assert!(registry.league_by_name("Chess").is_none());

    registry.repository_mut().fail_next_write("disk full");
    assert!(registry.employee_mut(jane).unwrap().set_last_name("Smith").is_err());
    assert_eq!(registry.employee(jane).unwrap().last_name(), "Doe");

    registry.repository_mut().fail_next_write("disk full");
    assert!(registry.remove_employee(jane).is_err());
    assert_eq!(registry.league(darts).unwrap().administrator(), Some(jane));
    assert!(registry.league(darts).unwrap().contains(jane));
}

#[test]
fn failed_administrator_delete_restores_previous_administrator() {
    let mut registry = fresh_registry();
    let root_id = registry.root().id();
    let darts = registry.add_league("Darts").unwrap().id();
    let jane = add_member(&mut registry, "Darts", "Doe", "jane@x.com");
    registry.league_mut(darts).unwrap().set_administrator(jane).unwrap();
    registry.repository_mut().clear_journal();

    // Hand-over to the root goes through, the row delete fails.
    registry.repository_mut().fail_nth_write(2, "disk full");
    let err = registry.remove_employee(jane).err().unwrap();
    assert!(matches!(
        err,
        RegistryError::Persistence(RepoError::Unavailable(ref reason)) if reason == "disk full"
    ));

    assert_eq!(
        registry.repository().journal(),
        &[
            JournalEntry::UpdateLeague {
                id: darts,
                administrator: Some(root_id),
            },
            JournalEntry::UpdateLeague {
                id: darts,
                administrator: Some(jane),
            },
        ]
    );
    let league = registry.league(darts).unwrap();
    assert_eq!(league.administrator(), Some(jane));
    assert!(league.contains(jane));
    assert!(registry.employee(jane).is_some());

    let stored = registry.repository().load_all().unwrap();
    assert_eq!(stored.leagues[0].administrator, Some(jane));
    assert!(stored.employees.iter().any(|employee| employee.id() == jane));
}

#[test]
fn authenticate_by_email_or_last_name() {
    let mut registry = fresh_registry();
    registry.add_league("Darts").unwrap();
    let jane = add_member(&mut registry, "Darts", "Doe", "jane@x.com");

    assert_eq!(registry.authenticate("JANE@x.com", "pw").unwrap().id(), jane);
    assert_eq!(registry.authenticate("Doe", "pw").unwrap().id(), jane);
    assert!(registry.authenticate("root", "toor").unwrap().is_root());
}

#[test]
fn authenticate_does_not_reveal_which_part_failed() {
    let mut registry = fresh_registry();
    registry.add_league("Darts").unwrap();
    add_member(&mut registry, "Darts", "Doe", "jane@x.com");

    assert!(matches!(
        registry.authenticate("unknown@x.com", "anything"),
        Err(RegistryError::AuthFailure)
    ));
    assert!(matches!(
        registry.authenticate("jane@x.com", "wrong"),
        Err(RegistryError::AuthFailure)
    ));
}

#[test]
fn user_exists_checks_email_and_name() {
    let mut registry = fresh_registry();
    registry.add_league("Darts").unwrap();
    add_member(&mut registry, "Darts", "Doe", "jane@x.com");

    assert!(registry.user_exists("jane@x.com").unwrap());
    assert!(registry.user_exists("Doe").unwrap());
    assert!(!registry.user_exists("nobody").unwrap());
}

#[test]
fn bootstrap_repairs_dangling_administrator() {
    let seeded = fresh_registry();
    let mut repo = seeded.repository().clone();
    let league = repo
        .insert_league(&personnel_core::NewLeague {
            name: "Orphans".to_string(),
            administrator: None,
        })
        .unwrap();

    let registry = PersonnelRegistry::bootstrap(repo, &RegistryConfig::default()).unwrap();
    assert_eq!(
        registry.league(league).unwrap().administrator(),
        Some(registry.root().id())
    );
}

#[test]
fn shared_registry_serializes_access() {
    let shared = fresh_registry().into_shared();

    let handles: Vec<_> = ["Darts", "Chess", "Pool"]
        .into_iter()
        .map(|name| {
            let shared = std::sync::Arc::clone(&shared);
            std::thread::spawn(move || {
                shared.lock().unwrap().add_league(name).map(|league| league.id())
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(shared.lock().unwrap().leagues().len(), 3);
}
