//! Proc macros for gilt-compose: the `descriptor!` RSX module markup.
//!
//! This crate is not meant to be used directly; enable the `macros` feature on `gilt-compose`.

use proc_macro::TokenStream;

mod descriptor_macro;

/// RSX-style module descriptor macro.
///
/// Transforms JSX-like markup into a `gilt_compose::module::ModuleNode`
/// built with its builder API.
///
/// # Syntax
///
/// - `<Type.Name />`: a module with no slots
/// - `<Type.Name attrs...> slot: <...> </Type.Name>`: a module with filled slots
/// - `slot: [<A />, <B />]`: a list slot
///
/// # Attributes
///
/// - `id="value"` becomes `.with_id("value")`
/// - `&name="target"` becomes `.with_reference("name", "target")`
/// - `name=literal` or `name={expr}` becomes `.with_property("name", value)`
///
/// Repeating a slot name appends to that slot, like `ModuleNode::with_slot`.
///
/// # Example
///
/// ```ignore
/// let node = descriptor! {
///     <ContentGroup.ContentGroup id="featured" page_size=4>
///         selection: <Selection.Featured>
///             filter: [<Filter.Unread />]
///         </Selection.Featured>
///         arrangement: <Arrangement.List max_cards=8>
///             card: <Card.Default />
///         </Arrangement.List>
///     </ContentGroup.ContentGroup>
/// };
/// ```
#[proc_macro]
pub fn descriptor(input: TokenStream) -> TokenStream {
    descriptor_macro::descriptor_impl(input.into())
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
