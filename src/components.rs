//! Yew view components for the ladder page.
//!
//! Rows are rendered from whatever the row binding currently holds; a slot
//! with no data yet shows only its rank position.

use crate::hooks::use_row_binding;
use ladder_view::http::HttpRosterSource;
use ladder_view::{ChallengeRecord, PagedCache, RowRecord, ScrollState};
use std::rc::Rc;
use yew::prelude::*;

/// What the challenge area of a row shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ChallengeControl {
    Button,
    NotChallengeable(Option<String>),
    Hidden,
}

/// Rank to print for a slot: the row's rank when known, else its position.
pub fn rank_label(index: usize, row: Option<&RowRecord>) -> i64 {
    row.map(|r| r.rank as i64)
        .filter(|&rank| rank > 0)
        .unwrap_or(index as i64 + 1)
}

pub fn challenge_control(row: &RowRecord) -> ChallengeControl {
    match &row.can_challenge {
        Some(eligibility) if eligibility.challengeable => ChallengeControl::Button,
        Some(eligibility) => ChallengeControl::NotChallengeable(eligibility.reason_text()),
        None => ChallengeControl::Hidden,
    }
}

fn render_challenge_list(class: &'static str, arrow: &'static str, challenges: &[ChallengeRecord]) -> Html {
    if challenges.is_empty() {
        return html! {};
    }
    html! {
        <div class={class}>
            <span class="arrow">{ arrow }</span>
            <span class="challenge-list">
                { challenges.iter().map(|challenge| html! {
                    <a class="challenge-link" href={format!("/game/{}", challenge.game_id)}>
                        <span class="challenge-rank">{ format!("#{}", challenge.player.ladder_rank) }</span>
                        <span class="Player">{ &challenge.player.username }</span>
                    </a>
                }).collect::<Html>() }
            </span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct LadderRowProps {
    pub index: usize,
    pub scroll: ScrollState,
    pub generation: u64,
    pub highlight_rank: i32,
    pub cache: PagedCache<HttpRosterSource>,
    pub on_challenge: Callback<Rc<RowRecord>>,
}

#[function_component(LadderRow)]
pub fn ladder_row(props: &LadderRowProps) -> Html {
    let row = use_row_binding(&props.cache, props.index, props.scroll, props.generation);

    let highlighted = row.as_ref().is_some_and(|r| r.rank == props.highlight_rank);
    let rank = rank_label(props.index, row.as_deref());

    let challenge = row.as_ref().map(|row| match challenge_control(row) {
        ChallengeControl::Button => {
            let on_challenge = props.on_challenge.clone();
            let row = Rc::clone(row);
            html! {
                <span class="challenge">
                    <button class="primary xs" onclick={Callback::from(move |_| on_challenge.emit(row.clone()))}>
                        { "Challenge" }
                    </button>
                </span>
            }
        }
        ChallengeControl::NotChallengeable(reason) => html! {
            <span class="challenge">
                <span class="not-challengable" title={reason}>{ "Not challengable" }</span>
            </span>
        },
        ChallengeControl::Hidden => html! {},
    });

    html! {
        <div class={classes!("LadderRow", highlighted.then_some("highlight"))}>
            <div class="ladder-player">
                <span class="rank">{ format!("# {}", rank) }</span>
                if let Some(row) = &row {
                    <span class="Player">{ &row.player.username }</span>
                }
                { challenge.unwrap_or_default() }
            </div>
            if let Some(row) = &row {
                <div class="challenges">
                    { render_challenge_list("outgoing", "\u{2192}", &row.outgoing_challenges) }
                    { render_challenge_list("incoming", "\u{2190}", &row.incoming_challenges) }
                </div>
            }
        </div>
    }
}
