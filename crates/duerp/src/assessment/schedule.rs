//! Follow-up views over a finished action plan: calendar, reminders, Gantt, and kanban.
//!
//! All dates are offsets from a caller-supplied start date so the views can be rebuilt
//! deterministically.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{ActionPlan, ActionPlanItem};

const REMINDER_COUNT: usize = 5;
const REMINDER_SPACING_DAYS: u64 = 3;
const GANTT_SPACING_DAYS: u64 = 3;
const GANTT_TASK_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub action_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub action_id: String,
    pub message: String,
    pub due: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanttTask {
    pub action_id: String,
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KanbanStage {
    Todo,
    Doing,
    Review,
    Done,
}

impl KanbanStage {
    pub fn title(&self) -> &'static str {
        match self {
            KanbanStage::Todo => "A planifier",
            KanbanStage::Doing => "En cours",
            KanbanStage::Review => "A verifier",
            KanbanStage::Done => "Cloture",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanbanColumn {
    pub stage: KanbanStage,
    pub title: String,
    pub items: Vec<ActionPlanItem>,
}

/// One event per action, every other day starting the day after `base`.
pub fn calendar(plan: &ActionPlan, base: NaiveDate) -> Vec<CalendarEvent> {
    plan.items
        .iter()
        .enumerate()
        .map(|(index, item)| CalendarEvent {
            action_id: item.action.id.clone(),
            title: item.action.title.clone(),
            date: offset(base, index as u64 * 2 + 1),
            weight: item.weight,
        })
        .collect()
}

/// Progress checks for the five heaviest actions, three days apart.
pub fn reminders(plan: &ActionPlan, today: NaiveDate) -> Vec<Reminder> {
    plan.items
        .iter()
        .take(REMINDER_COUNT)
        .enumerate()
        .map(|(index, item)| Reminder {
            action_id: item.action.id.clone(),
            message: format!("Verifier l'avancement de \"{}\"", item.action.title),
            due: offset(today, (index as u64 + 1) * REMINDER_SPACING_DAYS),
        })
        .collect()
}

pub fn gantt(plan: &ActionPlan, start: NaiveDate) -> Vec<GanttTask> {
    plan.items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let task_start = offset(start, index as u64 * GANTT_SPACING_DAYS);
            GanttTask {
                action_id: item.action.id.clone(),
                label: item.action.title.clone(),
                start: task_start,
                end: offset(task_start, GANTT_TASK_DAYS),
                status: if index == 0 {
                    TaskStatus::InProgress
                } else {
                    TaskStatus::NotStarted
                },
            }
        })
        .collect()
}

/// Splits the plan by weight rank: three to plan, two in progress, two to review, the rest
/// closed.
pub fn kanban(plan: &ActionPlan) -> Vec<KanbanColumn> {
    let mut sorted = plan.items.clone();
    sorted.sort_by(|left, right| right.weight.cmp(&left.weight));

    let slice = |from: usize, to: usize| -> Vec<ActionPlanItem> {
        let to = to.min(sorted.len());
        let from = from.min(to);
        sorted[from..to].to_vec()
    };

    [
        (KanbanStage::Todo, slice(0, 3)),
        (KanbanStage::Doing, slice(3, 5)),
        (KanbanStage::Review, slice(5, 7)),
        (KanbanStage::Done, slice(7, usize::MAX)),
    ]
    .into_iter()
    .map(|(stage, items)| KanbanColumn {
        stage,
        title: stage.title().to_string(),
        items,
    })
    .collect()
}

fn offset(base: NaiveDate, days: u64) -> NaiveDate {
    base.checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}
