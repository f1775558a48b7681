//! Ladder page built with Yew.
//! Wires the paged roster cache, the virtual window and the row components.

use ladder_view::config::{
    DEFAULT_VIEWPORT_PX, OVERSCAN_ROWS, ROW_HEIGHT_PX, SCROLL_SETTLE_MS,
};
use ladder_view::http::HttpRosterSource;
use ladder_view::window::{offset_of, render_range, slot_count, slot_for};
use ladder_view::{live, PagedCache, RosterHandle, RosterInfo, RowRecord};
use log::{info, warn};
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys::Element;
use yew::prelude::*;

mod components;
mod hooks;
mod utils;

use components::LadderRow;
use hooks::use_scroll_state;
use utils::{challenge_prompt, confirm, parse_ladder_route, LEAVE_PROMPT};

/// Push the cache's current generation into view state so every row re-syncs.
fn publish_generation(cache: &PagedCache<HttpRosterSource>, generation: &UseStateHandle<u64>) {
    generation.set(cache.generation());
}

#[derive(Properties, PartialEq)]
struct LadderProps {
    handle: RosterHandle,
}

#[function_component(Ladder)]
fn ladder(props: &LadderProps) -> Html {
    let handle = props.handle;

    // One cache for the lifetime of the page; switching ladders re-resolves it
    let cache = use_memo((), move |_| PagedCache::new(HttpRosterSource::default(), handle));

    let roster = use_state(|| None::<Rc<RosterInfo>>);
    let generation = use_state(|| 0u64);
    let highlight_rank = use_state(|| -1i32);
    let scroll_top = use_state(|| 0u32);
    let viewport_height = use_state(|| DEFAULT_VIEWPORT_PX);
    let viewport = use_node_ref();
    let (scroll, on_scroll_event) = use_scroll_state(SCROLL_SETTLE_MS);

    let resolve = {
        let cache = cache.clone();
        let roster = roster.clone();
        let generation = generation.clone();
        let highlight_rank = highlight_rank.clone();
        Callback::from(move |handle: RosterHandle| {
            let request = cache.resolve_roster(handle);
            publish_generation(&cache, &generation);
            if (*roster).as_ref().is_some_and(|r| r.id != handle) {
                roster.set(None);
            }

            let roster = roster.clone();
            let highlight_rank = highlight_rank.clone();
            spawn_local(async move {
                match request.await {
                    Ok(info) => {
                        highlight_rank.set(info.caller_rank().map_or(-1, |rank| rank as i32));
                        roster.set(Some(info));
                    }
                    Err(err) if err.is_stale() => {}
                    Err(err) => warn!("failed to load ladder {}: {}", handle, err),
                }
            });
        })
    };

    {
        let resolve = resolve.clone();
        use_effect_with(handle, move |&handle| {
            resolve.emit(handle);
            || ()
        });
    }

    // Membership changes pushed by the server
    {
        let resolve = resolve.clone();
        use_effect_with(handle, move |&handle| {
            let subscription = live::subscribe(handle, move || resolve.emit(handle));
            move || drop(subscription)
        });
    }

    // Jump to the viewer's own row once the ladder is known
    {
        let viewport = viewport.clone();
        let scroll_top = scroll_top.clone();
        let own_row = (*roster).as_ref().map(|r| (r.id, r.caller_rank()));
        use_effect_with(own_row, move |own_row| {
            let target = (*own_row)
                .and_then(|(_, rank)| rank)
                .map(|rank| offset_of(rank as usize - 1, ROW_HEIGHT_PX));
            if let (Some(target), Some(el)) = (target, viewport.cast::<Element>()) {
                el.set_scroll_top(target.min(i32::MAX as u64) as i32);
                scroll_top.set(el.scroll_top().max(0) as u32);
            }
            || ()
        });
    }

    {
        let cache = cache.clone();
        use_effect_with((), move |_| move || (*cache).clone().dispose());
    }

    let on_join = {
        let cache = cache.clone();
        let resolve = resolve.clone();
        Callback::from(move |_: MouseEvent| {
            let source = cache.source().clone();
            let handle = cache.handle();
            let resolve = resolve.clone();
            spawn_local(async move {
                match source.join(handle).await {
                    Ok(()) => resolve.emit(handle),
                    Err(err) => warn!("failed to join ladder {}: {}", handle, err),
                }
            });
        })
    };

    let on_leave = {
        let cache = cache.clone();
        let resolve = resolve.clone();
        Callback::from(move |_: MouseEvent| {
            if !confirm(LEAVE_PROMPT) {
                return;
            }
            let source = cache.source().clone();
            let handle = cache.handle();
            let resolve = resolve.clone();
            spawn_local(async move {
                match source.leave(handle).await {
                    Ok(()) => resolve.emit(handle),
                    Err(err) => warn!("failed to leave ladder {}: {}", handle, err),
                }
            });
        })
    };

    let on_challenge = {
        let cache = cache.clone();
        let generation = generation.clone();
        Callback::from(move |row: Rc<RowRecord>| {
            if !confirm(&challenge_prompt(&row.player.username)) {
                return;
            }
            let cache = cache.clone();
            let generation = generation.clone();
            spawn_local(async move {
                let handle = cache.handle();
                match cache.source().challenge(handle, row.player.id).await {
                    Ok(()) => {
                        info!("challenged {} on ladder {}", row.player.username, handle);
                        cache.invalidate();
                        publish_generation(&cache, &generation);
                    }
                    Err(err) => warn!("failed to challenge {}: {}", row.player.username, err),
                }
            });
        })
    };

    let onscroll = {
        let viewport = viewport.clone();
        let scroll_top = scroll_top.clone();
        let viewport_height = viewport_height.clone();
        Callback::from(move |_: Event| {
            if let Some(el) = viewport.cast::<Element>() {
                scroll_top.set(el.scroll_top().max(0) as u32);
                viewport_height.set(el.client_height().max(0) as u32);
            }
            on_scroll_event.emit(());
        })
    };

    let row_count = (*roster).as_ref().map_or(0, |r| r.size);
    let rows = render_range(
        *scroll_top,
        *viewport_height,
        ROW_HEIGHT_PX,
        row_count,
        OVERSCAN_ROWS,
    );
    let slots = slot_count(*viewport_height, ROW_HEIGHT_PX, OVERSCAN_ROWS);

    let header = match (*roster).as_ref() {
        Some(info) => {
            let action = if !info.can_join_or_leave() {
                html! {}
            } else if info.caller_rank().is_some() {
                html! { <button class="danger xs" onclick={on_leave}>{ "Leave" }</button> }
            } else {
                html! { <button class="primary xs" onclick={on_join}>{ "Join" }</button> }
            };
            html! {
                <div class="ladder-header">
                    <h2>{ &info.name }</h2>
                    <span class="ladder-size">{ format!("{} players", info.size) }</span>
                    { action }
                </div>
            }
        }
        None => html! { <div class="ladder-header loading">{ "Loading..." }</div> },
    };

    html! {
        <div class="Ladder">
            { header }
            <div class="ladder-viewport" ref={viewport} {onscroll} style="overflow-y: auto; height: 100%;">
                <div
                    class="ladder-rows"
                    style={format!("position: relative; height: {}px;", offset_of(row_count, ROW_HEIGHT_PX))}
                >
                    { for rows.map(|index| html! {
                        <div
                            key={slot_for(index, slots)}
                            class="ladder-slot"
                            style={format!(
                                "position: absolute; top: {}px; height: {}px; width: 100%;",
                                offset_of(index, ROW_HEIGHT_PX),
                                ROW_HEIGHT_PX
                            )}
                        >
                            <LadderRow
                                index={index}
                                scroll={scroll}
                                generation={*generation}
                                highlight_rank={*highlight_rank}
                                cache={(*cache).clone()}
                                on_challenge={on_challenge.clone()}
                            />
                        </div>
                    }) }
                </div>
            </div>
        </div>
    }
}

/// Routes `/ladder/<id>` to the ladder view.
#[function_component]
pub fn App() -> Html {
    let path = gloo_utils::window()
        .location()
        .pathname()
        .unwrap_or_default();
    match parse_ladder_route(&path) {
        Some(handle) => html! { <Ladder {handle} /> },
        None => html! { <div class="ladder-not-found">{ "Ladder not found" }</div> },
    }
}

/// Entry point: installs the panic hook and mounts the App component.
fn main() {
    console_error_panic_hook::set_once();
    yew::Renderer::<App>::new().render();
}
