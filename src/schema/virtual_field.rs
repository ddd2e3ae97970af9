//! Computed field resolvers
//!
//! A virtual field has no column of its own. When a path names one, the
//! compiler asks the field's resolver for the expression standing in for it.
//! Resolvers should be deterministic for a given context.

use std::fmt;
use std::sync::Arc;

use crate::expr::Operand;
use crate::filter::CompileContext;

/// Produces the backing expression of a virtual field.
///
/// `ctx.binding()` names the row the field is read from. Resolvers that do not
/// care may return unbound [`Operand::field`] references instead; the compiler
/// binds them to the current row.
pub trait VirtualResolver: Send + Sync {
    fn resolve(&self, field: &str, ctx: &CompileContext) -> Operand;
}

/// Resolver built from a `(field, context)` closure
pub struct ResolverFn<F>(pub F);

impl<F> VirtualResolver for ResolverFn<F>
where
    F: Fn(&str, &CompileContext) -> Operand + Send + Sync,
{
    fn resolve(&self, field: &str, ctx: &CompileContext) -> Operand {
        (self.0)(field, ctx)
    }
}

/// Adapter for resolvers that only take the field name
pub struct ContextFree<F>(pub F);

impl<F> VirtualResolver for ContextFree<F>
where
    F: Fn(&str) -> Operand + Send + Sync,
{
    fn resolve(&self, field: &str, _ctx: &CompileContext) -> Operand {
        (self.0)(field)
    }
}

/// Shared handle to a resolver
#[derive(Clone)]
pub struct Resolver(Arc<dyn VirtualResolver>);

impl Resolver {
    pub fn new(resolver: impl VirtualResolver + 'static) -> Self {
        Self(Arc::new(resolver))
    }

    pub fn resolve(&self, field: &str, ctx: &CompileContext) -> Operand {
        self.0.resolve(field, ctx)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_free_adapter() {
        let resolver = Resolver::new(ContextFree(|field: &str| {
            Operand::func("lower", vec![Operand::field(field.trim_end_matches("_lower"))])
        }));

        let op = resolver.resolve("name_lower", &CompileContext::new());
        assert_eq!(op, Operand::func("lower", vec![Operand::field("name")]));
    }

    #[test]
    fn test_contextual_resolver_sees_binding() {
        let resolver = Resolver::new(ResolverFn(|_: &str, ctx: &CompileContext| {
            Operand::column(ctx.binding().unwrap_or("root"), "name")
        }));

        let ctx = CompileContext::new().scoped("s1", false);
        assert_eq!(
            resolver.resolve("display", &ctx),
            Operand::column("s1", "name")
        );
    }
}
