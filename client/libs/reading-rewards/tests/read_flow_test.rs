/// Reading rewards integration tests
/// A week of reading driven by a manual clock, checked against the sync channel
use chrono::{Duration, TimeZone, Utc};
use inboxzing_common::ManualClock;
use reading_rewards::{
    intent_channel, AwardReason, ReadTracker, ScoringConfig, ScoringEngine, SyncIntent,
};
use std::sync::Arc;

fn monday_morning() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap())
}

#[tokio::test]
async fn test_week_of_daily_reads() {
    let clock = monday_morning();
    let (tx, mut rx) = intent_channel();
    let mut tracker = ReadTracker::new(
        Arc::new(clock.clone()),
        ScoringEngine::new(ScoringConfig::default()).unwrap(),
    )
    .with_sync(tx);

    // Mon..Sun, one 30s read per day, each a little over a day apart
    let mut earned = Vec::new();
    for day in 0..7 {
        tracker.open(format!("https://news.example/day-{}", day)).unwrap();
        clock.advance(Duration::seconds(30));
        earned.push(tracker.close().unwrap().total_earned());
        clock.advance(Duration::hours(25));
    }

    // Streak before each read: 0,1,2,3,4 on weekdays, then 5 on the weekend (doubled)
    assert_eq!(earned, vec![10, 11, 12, 13, 14, 30, 30]);
    assert_eq!(tracker.engine().state().streak, 7);
    assert_eq!(tracker.engine().state().points, 120);
    assert!(tracker
        .engine()
        .state()
        .milestones_reached
        .contains(&100));

    let mut reported = 0;
    let mut marked = 0;
    while let Ok(intent) = rx.try_recv() {
        match intent {
            SyncIntent::ReportPoints { points, reason } => {
                assert_eq!(reason, AwardReason::Read);
                reported += points;
            }
            SyncIntent::MarkAsRead { reading_secs, .. } => {
                assert_eq!(reading_secs, 30);
                marked += 1;
            }
        }
    }
    assert_eq!(reported, 120);
    assert_eq!(marked, 7);
}

#[tokio::test]
async fn test_missed_days_reset_streak() {
    let clock = monday_morning();
    let mut tracker = ReadTracker::new(
        Arc::new(clock.clone()),
        ScoringEngine::new(ScoringConfig::default()).unwrap(),
    );

    for day in 0..3 {
        tracker.open(format!("day-{}", day)).unwrap();
        clock.advance(Duration::seconds(30));
        tracker.close().unwrap();
        clock.advance(Duration::hours(25));
    }
    assert_eq!(tracker.engine().state().streak, 3);

    clock.advance(Duration::hours(30));
    assert!(tracker.check_streak_expiry());
    assert_eq!(tracker.engine().state().streak, 0);

    tracker.open("comeback").unwrap();
    clock.advance(Duration::seconds(30));
    let receipt = tracker.close().unwrap();
    assert_eq!(receipt.award.unwrap().streak, 1);
}

#[tokio::test]
async fn test_feed_completion_reports_bonus() {
    let clock = monday_morning();
    let (tx, mut rx) = intent_channel();
    let mut tracker = ReadTracker::new(
        Arc::new(clock.clone()),
        ScoringEngine::new(ScoringConfig::default()).unwrap(),
    )
    .with_sync(tx);

    tracker.load_feed(["a", "b", "c"]);
    tracker.record_click("a").unwrap();

    for article in ["a", "b", "c"] {
        tracker.open(article).unwrap();
        clock.advance(Duration::seconds(3));
        tracker.close().unwrap();
    }
    assert_eq!(tracker.unread_count(), 0);

    let bonuses: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|intent| {
            matches!(
                intent,
                SyncIntent::ReportPoints {
                    reason: AwardReason::AllRead,
                    ..
                }
            )
        })
        .collect();
    assert_eq!(
        bonuses,
        vec![SyncIntent::ReportPoints {
            points: 20,
            reason: AwardReason::AllRead
        }]
    );
    // 10 for the click, 20 for finishing the feed; the short reads earn nothing
    assert_eq!(tracker.engine().state().points, 30);
}
