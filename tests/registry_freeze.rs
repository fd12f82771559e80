use std::panic;

use anyhow::Result;
use relic::{
    persist_poly, persist_record, register_class, registry, InArchive, OutArchive, PolyPersist,
    Shared,
};

trait Node: PolyPersist {
    fn label(&self) -> &str;
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Leaf {
    name: String,
}
persist_record!(Leaf { name });

impl Node for Leaf {
    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Branch {
    name: String,
}
persist_record!(Branch { name });

impl Node for Branch {
    fn label(&self) -> &str {
        &self.name
    }
}

persist_poly!(Node);

/// The registry is process-wide, so the whole freeze lifecycle lives in a
/// single test: register, freeze, use the frozen table, then verify that
/// late registration is refused.
#[test]
fn frozen_registry_serves_lookups_and_refuses_registration() -> Result<()> {
    register_class!(Leaf, "Leaf", bases(Node));
    // Last registration wins; registering the same tag twice is fine.
    register_class!(Leaf, "Leaf", bases(Node));
    registry::freeze();
    registry::freeze(); // idempotent

    let node: Shared<dyn Node> = Shared::from_rc(std::rc::Rc::new(std::cell::RefCell::new(
        Leaf {
            name: "frozen".into(),
        },
    )));

    let mut out = Vec::new();
    let mut ar = OutArchive::text(&mut out);
    ar.put("node", &node)?;
    ar.finish()?;

    let mut restored: Shared<dyn Node> = Shared::empty();
    let mut ar = InArchive::text(out.as_slice())?;
    ar.take("node", &mut restored)?;
    assert_eq!(restored.borrow().label(), "frozen");

    let outcome = panic::catch_unwind(|| {
        register_class!(Branch, "Branch", bases(Node));
    });
    assert!(outcome.is_err(), "registration after freeze must panic");
    Ok(())
}
