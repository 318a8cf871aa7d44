use std::collections::BTreeSet;
use std::sync::Arc;
use taskdeck_core::{AccessBasis, Action, DeckConfig, DeckError, TargetRef, TaskDeck};
use taskdeck_model::{ArchiveFilter, UserId};
use taskdeck_policy::{DenyReason, TeamInheritance};
use taskdeck_test_utils::*;

fn deck_with(config: DeckConfig) -> TaskDeck {
    TaskDeck::new(seeded_store(), config).unwrap()
}

fn deck() -> TaskDeck {
    deck_with(DeckConfig::default())
}

fn grants(deck: &TaskDeck) -> BTreeSet<UserId> {
    deck.store().read().grantees(APOLLO)
}

#[tokio::test]
async fn replacing_access_revokes_previous_grantees() {
    let deck = deck();
    let ada = deck.actor(ADA).unwrap();
    let mia = deck.actor(MIA).unwrap();

    let basis = deck.authorize(&mia, Action::View, TargetRef::Project(APOLLO)).unwrap();
    assert_eq!(basis, AccessBasis::Grant);

    let kept = deck.replace_project_access(&ada, APOLLO, vec![LEE, LEE]).await.unwrap();
    assert_eq!(kept, BTreeSet::from([LEE]));

    let err = deck
        .authorize(&mia, Action::View, TargetRef::Project(APOLLO))
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(matches!(
        err,
        DeckError::Unauthorized {
            reason: DenyReason::NoProjectAccess(p),
            ..
        } if p == APOLLO
    ));
    assert!(!deck.scope(&mia).admits_project(APOLLO));
}

#[tokio::test]
async fn empty_replacement_clears_all_grants() {
    let deck = deck();
    let ada = deck.actor(ADA).unwrap();
    let lee = deck.actor(LEE).unwrap();

    let kept = deck
        .replace_project_access(&ada, APOLLO, Vec::<UserId>::new())
        .await
        .unwrap();
    assert!(kept.is_empty());
    assert!(grants(&deck).is_empty());
    assert!(deck
        .authorize(&lee, Action::View, TargetRef::Project(APOLLO))
        .unwrap_err()
        .is_unauthorized());
}

#[tokio::test]
async fn unknown_user_leaves_grants_untouched() {
    let deck = deck();
    let ada = deck.actor(ADA).unwrap();
    let before = grants(&deck);

    let err = deck
        .replace_project_access(&ada, APOLLO, vec![NOOR, UserId(999)])
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::NotFound { entity: "user", id: 999 }));
    assert_eq!(grants(&deck), before);
}

#[tokio::test]
async fn only_access_editors_replace_grants() {
    let deck = deck();
    let lee = deck.actor(LEE).unwrap();

    let err = deck
        .replace_project_access(&lee, APOLLO, vec![LEE])
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(deck.project_access(&lee, APOLLO).unwrap_err().is_unauthorized());

    let ada = deck.actor(ADA).unwrap();
    let names: Vec<String> = deck
        .project_access(&ada, APOLLO)
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, ["Lee", "Mia"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_replacements_never_mix() {
    let deck = Arc::new(deck());
    let ada = deck.actor(ADA).unwrap();

    let first = {
        let (deck, ada) = (Arc::clone(&deck), ada.clone());
        tokio::spawn(async move { deck.replace_project_access(&ada, APOLLO, vec![LEE]).await })
    };
    let second = {
        let (deck, ada) = (Arc::clone(&deck), ada.clone());
        tokio::spawn(async move {
            deck.replace_project_access(&ada, APOLLO, vec![NOOR, ZED]).await
        })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let last = grants(&deck);
    assert!(
        last == BTreeSet::from([LEE]) || last == BTreeSet::from([NOOR, ZED]),
        "grant sets interleaved: {last:?}"
    );
}

#[test]
fn team_leaders_inherit_from_granted_leader() {
    let deck = deck();
    let tia = deck.actor(TIA).unwrap();
    let noor = deck.actor(NOOR).unwrap();

    let basis = deck.authorize(&tia, Action::View, TargetRef::Project(APOLLO)).unwrap();
    assert_eq!(basis, AccessBasis::TeamLeader { via: LEE });

    // members of the same team do not inherit by default
    assert!(deck
        .authorize(&noor, Action::View, TargetRef::Project(APOLLO))
        .unwrap_err()
        .is_unauthorized());
}

#[test]
fn all_members_inheritance_is_configurable() {
    let deck = deck_with(DeckConfig::default().with_team_inheritance(TeamInheritance::AllMembers));
    let noor = deck.actor(NOOR).unwrap();

    let basis = deck.authorize(&noor, Action::View, TargetRef::Project(APOLLO)).unwrap();
    assert_eq!(basis, AccessBasis::TeamLeader { via: LEE });
}

#[test]
fn clients_reach_their_company_projects_read_only() {
    let deck = deck();
    let cal = deck.actor(CAL).unwrap();

    let basis = deck.authorize(&cal, Action::View, TargetRef::Project(CYGNUS)).unwrap();
    assert_eq!(basis, AccessBasis::ClientCompany(ACME));
    assert!(deck
        .authorize(&cal, Action::View, TargetRef::Project(BOREALIS))
        .unwrap_err()
        .is_unauthorized());

    let err = deck
        .authorize(&cal, Action::Reorder, TargetRef::Project(APOLLO))
        .unwrap_err();
    assert!(err.is_unauthorized());

    let names: Vec<String> = deck
        .list_accessible_projects(&cal, ArchiveFilter::Active)
        .unwrap()
        .into_iter()
        .map(|s| s.project.name)
        .collect();
    assert_eq!(names, ["Apollo", "Cygnus"]);
}

#[test]
fn archived_users_cannot_act() {
    let deck = deck();
    {
        let mut tx = deck.store().begin();
        let mut zed = tx.user(ZED).cloned().unwrap();
        zed.archival.archive(epoch());
        tx.put_user(zed);
        tx.commit();
    }
    assert!(matches!(
        deck.actor(ZED).unwrap_err(),
        DeckError::NotFound { entity: "user", .. }
    ));
}
