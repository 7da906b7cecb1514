use gridbuilder_core::store::{Handler, SetHandler};
use gridbuilder_core::{Element, GridItem, GridKey, GridRect, GridStore, GridValue, Viewport};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct Panel {
    updates: Cell<usize>,
}

impl Element for Panel {
    fn is_connected(&self) -> bool {
        true
    }

    fn request_update(&self) {
        self.updates.set(self.updates.get() + 1);
    }
}

fn store_with_items() -> GridStore {
    let store = GridStore::default();
    store.add_canvas("hero");
    for id in ["a", "b", "c"] {
        store.add_item("hero", GridItem::new("box", GridRect::new(0, 0, 2, 2)).with_id(id));
    }
    store
}

fn z(store: &GridStore, id: &str) -> i32 {
    store.find_item(id).map(|item| item.z_index).unwrap_or_default()
}

#[test]
fn test_send_to_back_reflows_through_store() {
    let store = store_with_items();
    assert_eq!((z(&store, "a"), z(&store, "b"), z(&store, "c")), (1, 2, 3));

    assert!(store.send_to_back("hero", "c"));
    assert_eq!((z(&store, "a"), z(&store, "b"), z(&store, "c")), (2, 3, 1));

    assert!(store.bring_to_front("hero", "a"));
    assert_eq!(z(&store, "a"), 4);
    assert!(store.undo());
    assert_eq!(z(&store, "a"), 2);
}

#[test]
fn test_reorder_notifies_only_canvases() {
    let store = store_with_items();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let on_set: SetHandler<GridKey, GridValue> =
        Rc::new(move |key: &GridKey, _: &GridValue, _: &GridValue| sink.borrow_mut().push(*key));
    let handle = store.store().on(Handler::Set(on_set));

    store.bring_forward("hero", "a");
    store.bring_forward("missing", "a");
    assert_eq!(*seen.borrow(), vec![GridKey::Canvases]);

    handle.unsubscribe();
    store.bring_forward("hero", "a");
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_bridge_rerenders_readers() {
    let store = store_with_items();
    let (bridge, _handle) = store.attach_bridge();
    let canvas_panel = Rc::new(Panel::default());
    let toolbar = Rc::new(Panel::default());
    let canvas_el: Rc<dyn Element> = canvas_panel.clone();
    let toolbar_el: Rc<dyn Element> = toolbar.clone();

    bridge.render(&canvas_el, || store.canvases());
    bridge.render(&toolbar_el, || store.current_viewport());

    store.send_backward("hero", "b");
    assert_eq!(canvas_panel.updates.get(), 1);
    assert_eq!(toolbar.updates.get(), 0);

    store.set_viewport(Viewport::Mobile);
    assert_eq!(toolbar.updates.get(), 1);

    store.reset();
    assert_eq!(canvas_panel.updates.get(), 2);
    assert_eq!(toolbar.updates.get(), 2);
    assert!(store.canvases().is_empty());
}

#[test]
fn test_export_import_round_trip_between_stores() {
    let source = store_with_items();
    source.set_viewport(Viewport::Mobile);
    let json = source.export().to_json().unwrap();

    let target = GridStore::default();
    target.set_active_canvas("hero");
    target.import_json(&json).unwrap();

    assert_eq!(target.current_viewport(), Viewport::Mobile);
    assert_eq!(target.active_canvas_id(), None);
    assert_eq!(target.read(|state| state.item_count()), 3);
    assert!(target.bring_to_front("hero", "a"));
    assert_eq!(z(&target, "a"), 4);
}
