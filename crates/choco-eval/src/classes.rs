//! Class registry with flattened method and attribute tables.

use crate::error::EvalError;
use crate::value::Value;
use choco_types::ast::{ClassDef, Declaration, FuncDef};
use std::collections::BTreeMap;

/// Name of the root class; a class whose superclass is `object` inherits nothing.
pub const ROOT_CLASS: &str = "object";

/// Declared type and default of one attribute.
#[derive(Debug, Clone)]
pub struct AttrInfo {
    pub type_name: String,
    pub default: Value,
}

/// A class with its own and inherited members merged.
#[derive(Debug, Clone)]
pub struct ClassInfo<'p> {
    pub name: String,
    pub super_class: String,
    pub methods: BTreeMap<String, &'p FuncDef>,
    pub attrs: BTreeMap<String, AttrInfo>,
}

/// Classes declared by one program, keyed by name.
#[derive(Debug, Default)]
pub struct ClassRegistry<'p> {
    classes: BTreeMap<String, ClassInfo<'p>>,
}

impl<'p> ClassRegistry<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, copying the superclass's tables and overlaying
    /// this class's methods and attributes by name.
    ///
    /// The superclass must already be registered.
    pub fn register_class(&mut self, decl: &'p ClassDef) -> Result<(), EvalError> {
        let name = decl.name.name.clone();
        let super_class = decl.super_class.name.clone();

        let (mut methods, mut attrs) = if super_class == ROOT_CLASS {
            (BTreeMap::new(), BTreeMap::new())
        } else {
            let parent = self
                .classes
                .get(&super_class)
                .ok_or_else(|| EvalError::UnknownSuperclass {
                    class: name.clone(),
                    superclass: super_class.clone(),
                })?;
            (parent.methods.clone(), parent.attrs.clone())
        };

        for member in &decl.declarations {
            match member {
                Declaration::FuncDef(method) => {
                    methods.insert(method.name.name.clone(), method);
                }
                Declaration::VarDef(attr) => {
                    attrs.insert(
                        attr.var.identifier.name.clone(),
                        AttrInfo {
                            type_name: attr.var.type_ann.to_string(),
                            default: Value::from_literal(&attr.value),
                        },
                    );
                }
                _ => {}
            }
        }

        tracing::debug!(class = %name, %super_class, methods = methods.len(), attrs = attrs.len(), "registered class");
        self.classes.insert(
            name.clone(),
            ClassInfo {
                name,
                super_class,
                methods,
                attrs,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ClassInfo<'p>> {
        self.classes.get(name)
    }

    /// Method lookup that reports absence as `None`.
    pub fn find_method(&self, class: &str, method: &str) -> Option<&'p FuncDef> {
        self.classes.get(class)?.methods.get(method).copied()
    }

    /// Method lookup for dispatch.
    pub fn resolve_method(&self, class: &str, method: &str) -> Result<&'p FuncDef, EvalError> {
        let info = self
            .classes
            .get(class)
            .ok_or_else(|| EvalError::UnknownClass(class.to_string()))?;
        info.methods
            .get(method)
            .copied()
            .ok_or_else(|| EvalError::NoSuchMethod {
                class: class.to_string(),
                method: method.to_string(),
            })
    }

    /// Allocate an instance with every attribute set to a private copy of its default.
    pub fn instantiate(&self, class: &str) -> Option<Value> {
        let info = self.classes.get(class)?;
        let attrs = info
            .attrs
            .iter()
            .map(|(name, attr)| (name.clone(), attr.default.deep_copy()))
            .collect();
        Some(Value::object(info.name.clone(), attrs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choco_types::ast::{
        Identifier, IntegerLiteral, Literal, NoneLiteral, TypeAnnotation, TypedVar, VarDef,
    };
    use choco_types::Span;

    fn ident(name: &str) -> Identifier {
        Identifier::new(name, Span::default())
    }

    fn attr(name: &str, ty: &str, value: Literal) -> Declaration {
        Declaration::VarDef(VarDef {
            location: Span::default(),
            var: TypedVar {
                location: Span::default(),
                identifier: ident(name),
                type_ann: TypeAnnotation::class(ty, Span::default()),
            },
            value,
        })
    }

    fn method(name: &str) -> Declaration {
        Declaration::FuncDef(FuncDef {
            location: Span::default(),
            name: ident(name),
            params: vec![],
            return_type: None,
            declarations: vec![],
            statements: vec![],
        })
    }

    fn int(value: i32) -> Literal {
        Literal::IntegerLiteral(IntegerLiteral {
            location: Span::default(),
            value,
        })
    }

    fn class(name: &str, super_class: &str, declarations: Vec<Declaration>) -> ClassDef {
        ClassDef {
            location: Span::default(),
            name: ident(name),
            super_class: ident(super_class),
            declarations,
        }
    }

    #[test]
    fn test_flattening_and_override() {
        let animal = class(
            "Animal",
            ROOT_CLASS,
            vec![attr("legs", "int", int(4)), method("speak"), method("move")],
        );
        let bird = class(
            "Bird",
            "Animal",
            vec![attr("legs", "int", int(2)), method("speak")],
        );
        let mut registry = ClassRegistry::new();
        registry.register_class(&animal).unwrap();
        registry.register_class(&bird).unwrap();

        let info = registry.get("Bird").unwrap();
        assert_eq!(info.methods.len(), 2);
        assert_eq!(info.attrs["legs"].default, Value::Int(2));
        assert!(std::ptr::eq(
            registry.resolve_method("Bird", "move").unwrap(),
            registry.resolve_method("Animal", "move").unwrap()
        ));
        assert!(!std::ptr::eq(
            registry.resolve_method("Bird", "speak").unwrap(),
            registry.resolve_method("Animal", "speak").unwrap()
        ));
    }

    #[test]
    fn test_forward_superclass_is_rejected() {
        let child = class("Child", "Parent", vec![]);
        let mut registry = ClassRegistry::new();
        let err = registry.register_class(&child).unwrap_err();
        assert_eq!(
            err,
            EvalError::UnknownSuperclass {
                class: "Child".into(),
                superclass: "Parent".into()
            }
        );
        assert!(registry.get("Child").is_none());
    }

    #[test]
    fn test_missing_method() {
        let c = class("C", ROOT_CLASS, vec![]);
        let mut registry = ClassRegistry::new();
        registry.register_class(&c).unwrap();
        assert!(matches!(
            registry.resolve_method("C", "nope"),
            Err(EvalError::NoSuchMethod { .. })
        ));
        assert!(registry.find_method("C", "nope").is_none());
    }

    #[test]
    fn test_instantiate_fills_defaults() {
        let c = class(
            "Node",
            ROOT_CLASS,
            vec![
                attr("value", "int", int(3)),
                attr(
                    "next",
                    "Node",
                    Literal::NoneLiteral(NoneLiteral {
                        location: Span::default(),
                    }),
                ),
            ],
        );
        let mut registry = ClassRegistry::new();
        registry.register_class(&c).unwrap();
        let Some(Value::Object(obj)) = registry.instantiate("Node") else {
            panic!("expected an object");
        };
        let data = obj.borrow();
        assert_eq!(data.class_name, "Node");
        assert_eq!(data.attrs["value"], Value::Int(3));
        assert_eq!(data.attrs["next"], Value::None);
        assert!(registry.instantiate("Missing").is_none());
    }
}
