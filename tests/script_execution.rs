mod common;

use common::*;
use dbscripts::dbscript::command::{CommandKind, ScriptFlags};
use dbscripts::dbscript::dispatch::MIN_RESPAWN_DELAY_SECS;
use dbscripts::dbscript::{ExecutionPolicy, ScriptRow, ScriptTableKind};
use dbscripts::world::object::{Player, QuestStatus};
use dbscripts::world::{Position, WorldEvent};

const EVENT_TABLE: &str = "dbscripts_on_event";

fn emotes(events: &[WorldEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|event| match event {
            WorldEvent::Emote { emote, .. } => Some(*emote),
            _ => None,
        })
        .collect()
}

#[test]
fn steps_run_by_delay_then_row_order() {
    let engine = engine_with(vec![(
        EVENT_TABLE,
        vec![
            ScriptRow::new(EVENT_SIGNAL, 5, CommandKind::Emote as u32).with_data(3, 0),
            ScriptRow::new(EVENT_SIGNAL, 0, CommandKind::Emote as u32).with_data(1, 0),
            ScriptRow::new(EVENT_SIGNAL, 0, CommandKind::Emote as u32).with_data(2, 0),
        ],
    )]);
    let mut region = region();

    assert!(engine.scripts_start(
        &mut region,
        ScriptTableKind::Event,
        EVENT_SIGNAL,
        Some(GUARD),
        None,
        ExecutionPolicy::Normal
    ));
    assert_eq!(engine.update(&mut region, 0), 2);
    assert_eq!(emotes(region.events()), vec![1, 2]);

    assert_eq!(engine.update(&mut region, 4_999), 0);
    assert_eq!(engine.update(&mut region, 1), 1);
    assert_eq!(emotes(region.events()), vec![1, 2, 3]);
    assert!(region.schedule().is_empty());
}

#[test]
fn talk_picks_only_populated_text_slots() {
    let engine = engine_with(vec![(
        EVENT_TABLE,
        vec![ScriptRow::new(EVENT_SIGNAL, 0, CommandKind::Talk as u32).with_texts([TEXT_SAY, 0, TEXT_YELL, 0])],
    )]);
    let mut region = region();

    for _ in 0..40 {
        engine.scripts_start(
            &mut region,
            ScriptTableKind::Event,
            EVENT_SIGNAL,
            Some(GUARD),
            None,
            ExecutionPolicy::Normal,
        );
    }
    engine.update(&mut region, 0);

    let spoken: Vec<i32> = region
        .events()
        .iter()
        .filter_map(|event| match event {
            WorldEvent::Text { text_id, .. } => Some(*text_id),
            _ => None,
        })
        .collect();
    assert_eq!(spoken.len(), 40);
    assert!(spoken.iter().all(|id| *id == TEXT_SAY || *id == TEXT_YELL));
    assert!(spoken.contains(&TEXT_SAY));
    assert!(spoken.contains(&TEXT_YELL));
}

#[test]
fn start_event_is_unique_per_game_object_source() {
    let engine = engine_with(vec![(
        EVENT_TABLE,
        vec![ScriptRow::new(EVENT_SIGNAL, 3, CommandKind::Emote as u32).with_data(1, 0)],
    )]);
    let mut region = region();

    assert!(engine.start_event(&mut region, EVENT_SIGNAL, SIGNAL_FIRE, Some(ALICE), true, None));
    assert!(!engine.start_event(&mut region, EVENT_SIGNAL, SIGNAL_FIRE, Some(BOB), true, None));
    assert_eq!(region.schedule().pending_invocations(), 1);

    // Once the first run finished the event may start again.
    engine.update(&mut region, 3_000);
    assert!(region.schedule().is_empty());
    assert!(engine.start_event(&mut region, EVENT_SIGNAL, SIGNAL_FIRE, Some(BOB), true, None));
}

#[test]
fn terminate_condition_fails_quest_for_incomplete_group_members() {
    let engine = engine_with(vec![(
        EVENT_TABLE,
        vec![
            ScriptRow::new(EVENT_SIGNAL, 0, CommandKind::TerminateCondition as u32)
                .with_data(COND_ESCORT_INCOMPLETE, QUEST_ESCORT),
            ScriptRow::new(EVENT_SIGNAL, 1, CommandKind::Emote as u32).with_data(2, 0),
        ],
    )]);
    let mut region = region();
    region.add_player(Player::new(4, "Dave", Position::new(5.0, 0.0, 0.0, 0.0), 0));
    region.form_group(1, &[ALICE, BOB, CAROL, DAVE]);
    for (player, status) in [
        (ALICE, QuestStatus::Incomplete),
        (BOB, QuestStatus::Incomplete),
        (CAROL, QuestStatus::Complete),
        (DAVE, QuestStatus::Failed),
    ] {
        region.player_mut(player).unwrap().quests.insert(QUEST_ESCORT, status);
    }

    engine.scripts_start(
        &mut region,
        ScriptTableKind::Event,
        EVENT_SIGNAL,
        Some(GUARD),
        Some(ALICE),
        ExecutionPolicy::Normal,
    );
    engine.update(&mut region, 0);

    assert_eq!(region.player(ALICE).unwrap().quest_status(QUEST_ESCORT), Some(QuestStatus::Failed));
    assert_eq!(region.player(BOB).unwrap().quest_status(QUEST_ESCORT), Some(QuestStatus::Failed));
    // Members who already finished or failed the quest keep their status.
    assert_eq!(region.player(CAROL).unwrap().quest_status(QUEST_ESCORT), Some(QuestStatus::Complete));
    assert_eq!(region.player(DAVE).unwrap().quest_status(QUEST_ESCORT), Some(QuestStatus::Failed));
    let failed = region
        .events()
        .iter()
        .filter(|event| matches!(event, WorldEvent::QuestFailed { .. }))
        .count();
    assert_eq!(failed, 2);

    // The emote after the termination never runs.
    assert!(region.schedule().is_empty());
    engine.update(&mut region, 1_000);
    assert!(emotes(region.events()).is_empty());
}

#[test]
fn terminate_condition_not_met_lets_the_script_continue() {
    let engine = engine_with(vec![(
        EVENT_TABLE,
        vec![
            ScriptRow::new(EVENT_SIGNAL, 0, CommandKind::TerminateCondition as u32)
                .with_data(COND_ESCORT_INCOMPLETE, QUEST_ESCORT),
            ScriptRow::new(EVENT_SIGNAL, 1, CommandKind::Emote as u32).with_data(2, 0),
        ],
    )]);
    let mut region = region();

    engine.scripts_start(
        &mut region,
        ScriptTableKind::Event,
        EVENT_SIGNAL,
        Some(GUARD),
        Some(CAROL),
        ExecutionPolicy::Normal,
    );
    engine.update(&mut region, 1_000);
    assert_eq!(emotes(region.events()), vec![2]);
}

#[test]
fn respawn_delay_has_a_floor() {
    let engine = engine_with(vec![(
        EVENT_TABLE,
        vec![ScriptRow::new(EVENT_SIGNAL, 0, CommandKind::RespawnGameObject as u32).with_data(CHEST.counter(), 2)],
    )]);
    let mut region = region();
    assert!(!region.game_object(CHEST).unwrap().spawned);

    engine.scripts_start(
        &mut region,
        ScriptTableKind::Event,
        EVENT_SIGNAL,
        Some(GUARD),
        None,
        ExecutionPolicy::Normal,
    );
    engine.update(&mut region, 0);

    assert!(region.game_object(CHEST).unwrap().spawned);
    assert!(region.events().contains(&WorldEvent::Respawned {
        guid: CHEST,
        despawn_after_secs: MIN_RESPAWN_DELAY_SECS,
    }));
}

#[test]
fn terminate_script_halts_later_steps() {
    // With the additional flag the script ends when the thug is within range.
    let engine = engine_with(vec![(
        EVENT_TABLE,
        vec![
            ScriptRow::new(EVENT_SIGNAL, 0, CommandKind::TerminateScript as u32)
                .with_data(THUG_ENTRY, 20)
                .with_flags(ScriptFlags::COMMAND_ADDITIONAL.bits()),
            ScriptRow::new(EVENT_SIGNAL, 2, CommandKind::Emote as u32).with_data(1, 0),
            ScriptRow::new(EVENT_SIGNAL, 4, CommandKind::Emote as u32).with_data(2, 0),
        ],
    )]);
    let mut region = region();

    engine.scripts_start(
        &mut region,
        ScriptTableKind::Event,
        EVENT_SIGNAL,
        Some(GUARD),
        None,
        ExecutionPolicy::Normal,
    );
    assert_eq!(region.schedule().pending_steps(), 3);
    engine.update(&mut region, 0);
    assert!(region.schedule().is_empty());
    engine.update(&mut region, 5_000);
    assert!(emotes(region.events()).is_empty());
}
