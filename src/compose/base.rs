use std::rc::Rc;

use crate::ds::definition::Definition;
use crate::ds::value::Value;

/// The one mixin shipped with the engine itself.
///
/// It is merged (without overwrite) into every class right after the base
/// definition. Its initializer gives every instance stable-receiver binding
/// for the members the contributing blueprints declared as bound, and its
/// `bind` method lets composed code rebind further members by name at any
/// point: `instance.call("bind", &["refresh".into()])`.
pub(crate) fn capability() -> Rc<Definition> {
    Rc::new(
        Definition::new()
            .add_method("bind", |receiver, args| {
                for arg in args {
                    if let Value::Str(name) = arg {
                        receiver.bind(name);
                    }
                }
                Ok(Value::Undefined)
            })
            .with_initializer(|receiver, _args| {
                let names = receiver.class().bound_members();
                receiver.bind_all(&names);
                Ok(())
            }),
    )
}
