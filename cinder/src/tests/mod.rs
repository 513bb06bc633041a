
use std::cell::Cell;
use std::rc::Rc;

use crate::headless::{HeadlessRenderer, Node, QueueScheduler};
use crate::{html::*, Component, Phase, Root, View};

use self::components::{Echo, Items, Journal, MountCounter, Shapeshifter};

/// Mounts `component` into a fresh `<main>` node. Nothing scheduled by the mount has run yet.
fn mount<C: Component>(component: C) -> (Root<C>, Node, QueueScheduler) {
    let host = Node::element("main");
    let scheduler = QueueScheduler::new();
    let root = Root::new(
        Box::new(host.clone()),
        component,
        HeadlessRenderer::new(),
        scheduler.clone(),
    );
    (root, host, scheduler)
}

#[test]
fn initial_view_is_committed_before_mount_updates_apply() {
    let (root, host, scheduler) = mount(MountCounter::new(Some(7)));

    assert_eq!(host.to_html(), "<main><div>0</div></main>");
    assert_eq!(root.with_state(|value| *value), 0);
    assert_eq!(root.phase(), Phase::Initial);

    scheduler.run_until_idle();
    assert_eq!(host.to_html(), "<main><div>7</div></main>");
    assert_eq!(root.with_state(|value| *value), 7);
    assert_eq!(root.phase(), Phase::Mounted);
}

#[test]
fn mount_hook_runs_exactly_once() {
    let counter = MountCounter::new(Some(1));
    let mount_calls = counter.mount_calls.clone();
    let (root, host, scheduler) = mount(counter);
    scheduler.run_until_idle();

    let div = host.find_by_tag("div").remove(0);
    for _ in 0..3 {
        div.click();
        scheduler.run_until_idle();
    }
    assert_eq!(mount_calls.get(), 1);
    assert_eq!(root.with_state(|value| *value), 4);
}

#[test]
fn mount_cycle_completes_without_mount_updates() {
    let counter = MountCounter::new(None);
    let renders = counter.renders.clone();
    let (root, host, scheduler) = mount(counter);

    assert_eq!(scheduler.run_until_idle(), 1);
    assert_eq!(root.phase(), Phase::Mounted);
    assert_eq!(renders.get(), 2);
    assert_eq!(host.text_content(), "0");
}

#[test]
fn batched_updates_apply_in_order_with_one_render() {
    let (root, host, scheduler) = mount(Journal);
    scheduler.run_until_idle();

    let setter = root.setter();
    setter.update(|entries| entries.push('a'));
    setter.update(|entries| entries.push('b'));
    setter.set(vec!['x']);
    setter.update(|entries| entries.push('c'));

    assert_eq!(scheduler.pending(), 1);
    assert_eq!(host.text_content(), "");
    assert_eq!(scheduler.run_until_idle(), 1);
    assert_eq!(root.with_state(|entries| entries.clone()), vec!['x', 'c']);
    assert_eq!(host.text_content(), "xc");
}

#[test]
fn clicks_before_a_rerender_are_not_lost() {
    let counter = MountCounter::new(Some(1));
    let renders = counter.renders.clone();
    let (root, host, scheduler) = mount(counter);
    scheduler.run_until_idle();
    let renders_after_mount = renders.get();

    let div = host.find_by_tag("div").remove(0);
    for _ in 0..5 {
        div.click();
    }
    scheduler.run_until_idle();

    assert_eq!(root.with_state(|value| *value), 6);
    assert_eq!(renders.get(), renders_after_mount + 1);
    assert_eq!(host.text_content(), "6");
}

#[test]
fn clicks_before_the_mount_flush_apply_after_the_mount_update() {
    let (root, host, scheduler) = mount(MountCounter::new(Some(1)));
    host.find_by_tag("div")[0].click();
    scheduler.run_until_idle();

    assert_eq!(root.with_state(|value| *value), 2);
}

#[test]
fn unchanged_nodes_are_patched_in_place() {
    let (root, host, scheduler) = mount(MountCounter::new(Some(3)));
    let div = host.find_by_tag("div").remove(0);
    let text_node = div.children().remove(0);
    scheduler.run_until_idle();

    assert!(host.children()[0].ptr_eq(&div));
    assert!(div.children()[0].ptr_eq(&text_node));
    assert_eq!(text_node.text_content(), "3");
    assert_eq!(root.with_renderer(HeadlessRenderer::created), Some(2));
}

#[test]
fn nodes_of_a_different_kind_are_replaced() {
    let (_root, host, scheduler) = mount(Shapeshifter);
    scheduler.run_until_idle();
    let button = host.find_by_tag("button").remove(0);
    assert_eq!(
        host.to_html(),
        "<main><div><button>next</button><h1>title</h1></div></main>"
    );

    button.click();
    scheduler.run_until_idle();
    assert_eq!(
        host.to_html(),
        "<main><div><button>next</button><p>body</p></div></main>"
    );

    button.click();
    scheduler.run_until_idle();
    assert_eq!(
        host.to_html(),
        "<main><div><button>next</button>bare</div></main>"
    );

    button.click();
    scheduler.run_until_idle();
    assert_eq!(
        host.to_html(),
        "<main><div><button>next</button><h1>title</h1></div></main>"
    );
    assert!(host.find_by_tag("button")[0].ptr_eq(&button));
}

#[test]
fn children_and_attributes_follow_the_state() {
    let (root, host, scheduler) = mount(Items);
    scheduler.run_until_idle();
    assert_eq!(host.to_html(), "<main><ul><li>0</li><li>1</li></ul></main>");

    let setter = root.setter();
    setter.set(3);
    scheduler.run_until_idle();
    assert_eq!(
        host.to_html(),
        "<main><ul class=\"odd\"><li>0</li><li>1</li><li>2</li></ul></main>"
    );

    setter.set(0);
    scheduler.run_until_idle();
    assert_eq!(host.to_html(), "<main><ul></ul></main>");
}

#[test]
fn listeners_are_rebound_and_removed() {
    let heard = Rc::new(Cell::new(0));
    let (root, host, scheduler) = mount(Echo {
        heard: heard.clone(),
    });
    scheduler.run_until_idle();
    let button = host.find_by_tag("button").remove(0);

    button.click();
    assert_eq!(heard.get(), 1);

    root.setter().set(2);
    scheduler.run_until_idle();
    button.click();
    assert_eq!(heard.get(), 2);

    root.setter().set(3);
    scheduler.run_until_idle();
    assert!(!button.has_listener("click"));
}

#[test]
fn existing_children_of_the_host_are_cleared() {
    let host = Node::element("main");
    let mut renderer = HeadlessRenderer::new();
    let stale = crate::renderer::Renderer::create_text(&mut renderer, "stale");
    let host_handle: crate::renderer::NativeHandle = Box::new(host.clone());
    crate::renderer::Renderer::append_child(&mut renderer, &host_handle, &stale);
    assert_eq!(host.text_content(), "stale");

    let _root = Root::new(host_handle, Journal, renderer, QueueScheduler::new());
    assert_eq!(host.to_html(), "<main><p></p></main>");
}

#[test]
fn unmount_clears_the_host_and_silences_setters() {
    let (root, host, scheduler) = mount(MountCounter::new(Some(1)));
    scheduler.run_until_idle();
    let div = host.find_by_tag("div").remove(0);
    let setter = root.setter();
    setter.update(|value| *value += 10);

    root.unmount();
    assert_eq!(host.to_html(), "<main></main>");
    assert!(!setter.is_live());

    // Stale listeners and setters are no-ops once the root is gone.
    div.click();
    setter.set(5);
    scheduler.run_until_idle();
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(host.to_html(), "<main></main>");
}

#[test]
fn renderer_downcast_checks_the_type() {
    struct Other;
    impl crate::renderer::Renderer for Other {
        fn create_element(&mut self, _: &'static str) -> crate::renderer::NativeHandle {
            Box::new(())
        }
        fn create_text(&mut self, _: &str) -> crate::renderer::NativeHandle {
            Box::new(())
        }
        fn set_text(&mut self, _: &crate::renderer::NativeHandle, _: &str) {}
        fn set_attribute(&mut self, _: &crate::renderer::NativeHandle, _: &'static str, _: &str) {}
        fn remove_attribute(&mut self, _: &crate::renderer::NativeHandle, _: &'static str) {}
        fn set_listener(
            &mut self,
            _: &crate::renderer::NativeHandle,
            _: &'static str,
            _: Option<crate::view::Listener>,
        ) {
        }
        fn append_child(&mut self, _: &crate::renderer::NativeHandle, _: &crate::renderer::NativeHandle) {}
        fn replace_child(
            &mut self,
            _: &crate::renderer::NativeHandle,
            _: usize,
            _: &crate::renderer::NativeHandle,
        ) {
        }
        fn truncate_children(&mut self, _: &crate::renderer::NativeHandle, _: usize) {}
    }

    let (root, _, _) = mount(Journal);
    assert_eq!(root.with_renderer(|_: &Other| ()), None);
    assert!(root.with_renderer(|_: &HeadlessRenderer| ()).is_some());

    let other = Root::new(Box::new(()), Journal, Other, QueueScheduler::new());
    assert!(other.with_renderer(|_: &Other| ()).is_some());
}

#[test]
fn views_compare_by_structure_and_bound_events() {
    let a: View = button().on_click(|| {}).child(text("x")).into();
    let b: View = button().on_click(|| {}).child("x").into();
    let c: View = button().child(text("x")).into();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.text_content(), "x");
    assert!(a.as_element().map_or(false, |el| el.dispatch("click")));
    assert!(!c.as_element().map_or(true, |el| el.dispatch("click")));

    let d: View = p()
        .attr("class", "a")
        .attr("class", "b")
        .child(View::from(String::from("y")))
        .into();
    let d = d.as_element().unwrap();
    assert_eq!(d.attribute("class"), Some("b"));
    assert_eq!(d.attribute("id"), None);
    assert_eq!(d.child_views(), &[View::Text("y".to_string())]);
}

#[test]
fn flush_waits_until_the_root_is_released() {
    let (root, host, scheduler) = mount(MountCounter::new(Some(1)));
    scheduler.run_until_idle();
    root.setter().set(9);

    let ran = root.with_state(|value| {
        assert_eq!(*value, 1);
        scheduler.run_pending()
    });
    assert_eq!(ran, 1);
    // The flush found the root busy and put itself back on the queue.
    assert_eq!(scheduler.pending(), 1);
    assert_eq!(root.with_state(|value| *value), 1);
    assert_eq!(host.text_content(), "1");

    assert_eq!(scheduler.run_pending(), 1);
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(root.with_state(|value| *value), 9);
    assert_eq!(host.text_content(), "9");
}

#[test]
fn host_tree_can_be_searched() {
    let (_root, host, scheduler) = mount(Items);
    scheduler.run_until_idle();

    let list = host.find(|node| node.tag().as_deref() == Some("ul")).unwrap();
    assert_eq!(list.children_len(), 2);
    let second = host
        .find(|node| node.tag().as_deref() == Some("li") && node.text_content() == "1")
        .unwrap();
    assert!(list.children()[1].ptr_eq(&second));
    assert!(host.find(|node| node.tag().as_deref() == Some("table")).is_none());
}
