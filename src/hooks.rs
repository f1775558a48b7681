use gloo_timers::callback::Timeout;
use ladder_view::{Arrival, PagedCache, RosterSource, RowRecord, ScrollState, SyncOutcome, WindowBinding};
use log::warn;
use std::rc::Rc;
use yew::prelude::*;

/// Tracks whether the list is being scrolled.
///
/// Returns the current state and a callback to fire on every scroll event.
/// The state flips back to `Settled` once no scroll event arrived for
/// `settle_ms`.
#[hook]
pub fn use_scroll_state(settle_ms: u32) -> (ScrollState, Callback<()>) {
    let scrolling = use_state(|| false);
    let timer = use_mut_ref(|| None::<Timeout>);

    let on_scroll = {
        let scrolling = scrolling.clone();
        Callback::from(move |_: ()| {
            if !*scrolling {
                scrolling.set(true);
            }
            let settle = scrolling.clone();
            // Replacing the handle drops, and so cancels, the previous timeout
            *timer.borrow_mut() = Some(Timeout::new(settle_ms, move || settle.set(false)));
        })
    };

    (ScrollState::from_scrolling(*scrolling), on_scroll)
}

/// Keeps one list slot bound to `cache` and returns the row it should show.
///
/// Re-syncs whenever the slot's index, the scroll state or the cache
/// generation changes; the binding is torn down when the slot unmounts or the
/// cache is replaced.
#[hook]
pub fn use_row_binding<S>(
    cache: &PagedCache<S>,
    index: usize,
    scroll: ScrollState,
    generation: u64,
) -> Option<Rc<RowRecord>>
where
    S: RosterSource + 'static,
{
    let binding = use_memo(cache.clone(), move |cache| WindowBinding::new(cache.clone(), index));
    let update = use_force_update();

    // Teardown
    {
        use_effect_with(binding.clone(), |binding| {
            let binding = binding.clone();
            move || binding.unbind()
        });
    }

    {
        let binding = binding.clone();
        use_effect_with((index, scroll, generation), move |&(index, scroll, _)| {
            match binding.sync(index, scroll) {
                SyncOutcome::Adopted => update.force_update(),
                SyncOutcome::Kept => {}
                SyncOutcome::Pending(subscription) => {
                    wasm_bindgen_futures::spawn_local(async move {
                        match subscription.settle().await {
                            Arrival::Adopted => update.force_update(),
                            Arrival::Stale => {}
                            Arrival::Failed(err) => warn!("row {} failed to load: {}", index, err),
                        }
                    });
                }
            }
            || ()
        });
    }

    binding.row()
}
