use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use taskdeck_core::report::{
    ChartRow, DailyLoggedTimeRow, FixedPriceRow, IndividualPerformance, LoggedTimeRow,
    TaskStatus, WorkTotals,
};
use taskdeck_core::{
    Actor, DateRange, DeckConfig, DeckError, PerformanceStatus, Report, ReportKind, ReportRequest,
    TaskDeck, TimeFilters,
};
use taskdeck_model::{User, UserId};
use taskdeck_test_utils::*;

fn deck() -> TaskDeck {
    TaskDeck::new(seeded_store(), DeckConfig::default()).unwrap()
}

fn run(deck: &TaskDeck, actor: &Actor, kind: ReportKind, filters: TimeFilters) -> Result<Report, DeckError> {
    deck.compute_report_at(actor, &ReportRequest::new(kind).with_filters(filters), epoch())
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

fn logged(deck: &TaskDeck, actor: &Actor, filters: TimeFilters) -> Vec<LoggedTimeRow> {
    match run(deck, actor, ReportKind::LoggedTimeSum, filters).unwrap() {
        Report::LoggedTimeSum(rows) => rows,
        other => panic!("unexpected report {:?}", other.kind()),
    }
}

fn row(project: &str, user: UserId, user_name: &str, minutes: u64) -> LoggedTimeRow {
    let (project_id, company) = match project {
        "Apollo" => (APOLLO, ACME),
        _ => (BOREALIS, GLOBEX),
    };
    LoggedTimeRow {
        project_id,
        project_name: project.into(),
        project_rate: None,
        client_company_id: Some(company),
        user_id: user,
        user_name: user_name.into(),
        user_rate: None,
        minutes,
        hours: minutes as f64 / 60.0,
    }
}

#[test]
fn logged_time_defaults_to_completed_billable_last_week() {
    let deck = deck();
    let ada = deck.actor(ADA).unwrap();

    assert_eq!(
        logged(&deck, &ada, TimeFilters::default()),
        vec![row("Apollo", MIA, "Mia", 140), row("Borealis", NOOR, "Noor", 30)]
    );
    assert_eq!(
        logged(&deck, &ada, TimeFilters::default().with_completed(false)),
        vec![row("Apollo", MIA, "Mia", 45)]
    );
    assert_eq!(
        logged(&deck, &ada, TimeFilters::default().with_billable(false)),
        vec![row("Apollo", LEE, "Lee", 20)]
    );
}

#[test]
fn logged_time_hours_keep_full_precision() {
    let deck = deck();
    let ada = deck.actor(ADA).unwrap();
    let rows = logged(&deck, &ada, TimeFilters::default());
    assert!((rows[0].hours - 140.0 / 60.0).abs() < 1e-12);
    assert!((rows[0].hours - 2.33).abs() > 1e-6);
}

#[test]
fn logged_time_honours_range_project_and_user_filters() {
    let deck = deck();
    let ada = deck.actor(ADA).unwrap();

    let one_day = TimeFilters::default().with_date_range(DateRange::new(day(1), day(1)).unwrap());
    assert_eq!(
        logged(&deck, &ada, one_day),
        vec![row("Apollo", MIA, "Mia", 90), row("Borealis", NOOR, "Noor", 30)]
    );
    assert_eq!(
        logged(&deck, &ada, TimeFilters::default().with_projects([BOREALIS])),
        vec![row("Borealis", NOOR, "Noor", 30)]
    );
    assert_eq!(
        logged(&deck, &ada, TimeFilters::default().with_users([MIA])),
        vec![row("Apollo", MIA, "Mia", 140)]
    );
    assert!(logged(
        &deck,
        &ada,
        TimeFilters::default().with_date_range(DateRange::new(day(3), day(9)).unwrap())
    )
    .is_empty());
}

#[test]
fn daily_logged_time_groups_by_user_and_day() {
    let deck = deck();
    let ada = deck.actor(ADA).unwrap();
    let Report::DailyLoggedTime(rows) = run(&deck, &ada, ReportKind::DailyLoggedTime, TimeFilters::default()).unwrap()
    else {
        panic!("expected daily logged time");
    };

    let daily = |date, user_id, name: &str, minutes: u64| DailyLoggedTimeRow {
        date,
        user_id,
        user_name: name.into(),
        minutes,
        hours: minutes as f64 / 60.0,
    };
    assert_eq!(
        rows,
        vec![
            daily(day(1), MIA, "Mia", 90),
            daily(day(1), NOOR, "Noor", 30),
            daily(day(2), MIA, "Mia", 50),
        ]
    );
}

#[test]
fn fixed_price_sums_by_assignee() {
    let deck = deck();
    let ada = deck.actor(ADA).unwrap();

    let Report::FixedPriceSum(rows) = run(&deck, &ada, ReportKind::FixedPriceSum, TimeFilters::default()).unwrap()
    else {
        panic!("expected fixed price sum");
    };
    assert_eq!(
        rows,
        vec![FixedPriceRow {
            user_id: NOOR,
            user_name: "Noor".into(),
            total_fixed_price: KICKOFF_PRICE,
            total_tasks: 1,
        }]
    );

    let Report::FixedPriceSum(rows) =
        run(&deck, &ada, ReportKind::FixedPriceSum, TimeFilters::default().with_completed(false)).unwrap()
    else {
        panic!("expected fixed price sum");
    };
    assert!(rows.is_empty());
}

#[test]
fn time_reports_require_their_permissions() {
    let deck = deck();
    let lee = deck.actor(LEE).unwrap();
    for kind in [ReportKind::LoggedTimeSum, ReportKind::DailyLoggedTime, ReportKind::FixedPriceSum] {
        let err = run(&deck, &lee, kind, TimeFilters::default()).unwrap_err();
        assert!(err.is_unauthorized(), "{kind} should be refused");
    }
}

#[test]
fn time_reports_only_see_scoped_tasks() {
    let mut roles = BTreeMap::new();
    roles.insert(
        "team leader".to_owned(),
        vec!["view projects".to_owned(), "view logged time sum report".to_owned()],
    );
    let config = DeckConfig {
        roles: Some(roles),
        ..DeckConfig::default()
    };
    let deck = TaskDeck::new(seeded_store(), config).unwrap();
    let lee = deck.actor(LEE).unwrap();

    // Review PR was created by Ada, so Lee never sees its logged time
    assert!(logged(&deck, &lee, TimeFilters::default()).is_empty());
    assert_eq!(
        logged(&deck, &lee, TimeFilters::default().with_completed(false)),
        vec![row("Apollo", MIA, "Mia", 45)]
    );
}

#[test]
fn work_statistics_for_an_admin_cover_everything() {
    let deck = deck();
    let ada = deck.actor(ADA).unwrap();
    let Report::WorkStatistics(stats) = run(&deck, &ada, ReportKind::WorkStatistics, TimeFilters::default()).unwrap()
    else {
        panic!("expected work statistics");
    };

    assert_eq!(
        stats.statistics,
        WorkTotals {
            completed_tasks: 2,
            incomplete_tasks: 4,
            total_projects: 3,
        }
    );
    assert_eq!(stats.chart.len(), 6);

    assert_eq!(stats.team_performance.len(), 1);
    let team = &stats.team_performance[0];
    assert_eq!((team.assigned_tasks, team.completed_tasks), (5, 2));
    assert!((team.completion_rate - 40.0).abs() < 1e-9);
    assert_eq!(team.status, PerformanceStatus::Poor);

    let person = |user_id, name: &str, assigned, completed, rate, status| IndividualPerformance {
        user_id,
        name: name.into(),
        assigned_tasks: assigned,
        completed_tasks: completed,
        completion_rate: rate,
        status,
    };
    assert_eq!(
        stats.individual_performance,
        vec![
            person(NOOR, "Noor", 2, 1, 50.0, PerformanceStatus::Average),
            person(MIA, "Mia", 3, 1, 33.33, PerformanceStatus::Poor),
            person(LEE, "Lee", 0, 0, 0.0, PerformanceStatus::Poor),
            person(TIA, "Tia", 0, 0, 0.0, PerformanceStatus::Poor),
        ]
    );
}

#[test]
fn work_statistics_follow_task_visibility() {
    let deck = deck();

    let mia = deck.actor(MIA).unwrap();
    let Report::WorkStatistics(stats) = run(&deck, &mia, ReportKind::WorkStatistics, TimeFilters::default()).unwrap()
    else {
        panic!("expected work statistics");
    };
    let chart = |task: &str, status| ChartRow {
        project: "Apollo".into(),
        task: task.into(),
        status,
    };
    assert_eq!(
        stats.chart,
        vec![
            chart("Design schema", TaskStatus::Incomplete),
            chart("Review PR", TaskStatus::Completed),
            chart("Deploy", TaskStatus::Incomplete),
        ]
    );
    assert_eq!(
        stats.statistics,
        WorkTotals {
            completed_tasks: 1,
            incomplete_tasks: 2,
            total_projects: 1,
        }
    );

    let cal = deck.actor(CAL).unwrap();
    let Report::WorkStatistics(stats) = run(&deck, &cal, ReportKind::WorkStatistics, TimeFilters::default()).unwrap()
    else {
        panic!("expected work statistics");
    };
    assert_eq!(stats.chart, vec![chart("Design schema", TaskStatus::Incomplete)]);
}

#[test]
fn dashboard_for_a_member() {
    let deck = deck();
    let mia = deck.actor(MIA).unwrap();
    let Report::Dashboard(dash) = run(&deck, &mia, ReportKind::Dashboard, TimeFilters::default()).unwrap() else {
        panic!("expected dashboard");
    };

    assert_eq!(dash.projects.len(), 1);
    let apollo = &dash.projects[0];
    assert_eq!(
        (apollo.project_id, apollo.total, apollo.completed, apollo.overdue),
        (APOLLO, 3, 1, 1)
    );

    let overdue: Vec<_> = dash.overdue_tasks.iter().map(|t| (t.task_id, t.group_name.clone())).collect();
    assert_eq!(overdue, vec![(SCHEMA, Some("Backlog".to_owned()))]);

    let assigned: Vec<_> = dash.recently_assigned.iter().map(|t| t.task_id).collect();
    assert_eq!(assigned, vec![DEPLOY, SCHEMA]);

    let comments: Vec<_> = dash.recent_comments.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(comments, vec!["Blocked on review", "Use the v2 layout"]);
}

#[test]
fn dashboard_never_shows_unreachable_projects() {
    let deck = deck();
    let noor = deck.actor(NOOR).unwrap();
    let Report::Dashboard(dash) = run(&deck, &noor, ReportKind::Dashboard, TimeFilters::default()).unwrap() else {
        panic!("expected dashboard");
    };
    let ids: Vec<_> = dash.projects.iter().map(|p| p.project_id).collect();
    assert_eq!(ids, vec![BOREALIS]);
    assert!(dash.recently_assigned.is_empty());
    assert!(dash.overdue_tasks.is_empty());
}

#[test]
fn users_without_roles_get_nothing() {
    let deck = deck();
    {
        let mut tx = deck.store().begin();
        tx.put_user(User::new(UserId(500), "Nobody", "nobody@example.com"));
        tx.commit();
    }
    let nobody = deck.actor(UserId(500)).unwrap();
    for kind in ReportKind::ALL {
        assert!(run(&deck, &nobody, kind, TimeFilters::default())
            .unwrap_err()
            .is_unauthorized());
    }
}

#[test]
fn reports_serialize_with_their_kind() {
    let deck = deck();
    let ada = deck.actor(ADA).unwrap();
    let report = run(&deck, &ada, ReportKind::WorkStatistics, TimeFilters::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["kind"], "work_statistics");
    assert_eq!(json["data"]["statistics"]["completed_tasks"], 2);
    assert_eq!(json["data"]["individual_performance"][0]["status"], "Average");
}

#[test]
fn unbounded_window_covers_all_history() {
    let config = DeckConfig::from_toml_str("report_window_days = 4294967295").unwrap();
    let deck = TaskDeck::new(seeded_store(), config).unwrap();
    let ada = deck.actor(ADA).unwrap();

    let rows = logged(&deck, &ada, TimeFilters::default());
    let minutes: u64 = rows.iter().map(|r| r.minutes).sum();
    assert!(minutes >= 170);
}
