//! RSX descriptor! macro: parse JSX-like module markup and generate
//! `ModuleNode` builder code.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::{bracketed, braced, Error, Expr, Ident, Lit, LitStr, Result, Token};

// ---------------------------------------------------------------------------
// AST types
// ---------------------------------------------------------------------------

/// A dotted module type name such as `Selection.All`.
#[derive(Clone)]
pub(crate) struct TypeName {
    pub segments: Vec<Ident>,
}

impl TypeName {
    fn value(&self) -> String {
        self.segments
            .iter()
            .map(Ident::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn span(&self) -> Span {
        self.segments[0].span()
    }
}

/// A property value: a literal, or an arbitrary expression in braces.
#[derive(Clone)]
pub(crate) enum Value {
    Lit(Lit),
    Expr(Expr),
}

/// One attribute of an element.
#[derive(Clone)]
pub(crate) enum Attribute {
    /// `id="name"`
    Id(LitStr),
    /// `&name="target"`
    Reference { name: Ident, target: LitStr },
    /// `name=value`
    Property { name: Ident, value: Value },
}

/// What a slot holds: one element, or a bracketed list.
#[derive(Clone)]
pub(crate) enum SlotValue {
    One(Element),
    List(Vec<Element>),
}

#[derive(Clone)]
pub(crate) struct Slot {
    pub name: Ident,
    pub value: SlotValue,
}

/// `<Type attrs... />` or `<Type attrs...> slot: <...> ... </Type>`.
#[derive(Clone)]
pub(crate) struct Element {
    pub type_name: TypeName,
    pub attrs: Vec<Attribute>,
    pub slots: Vec<Slot>,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("type_name", &self.type_name.value())
            .field("attrs", &self.attrs.len())
            .field("slots", &self.slots.iter().map(|s| s.name.to_string()).collect::<Vec<_>>())
            .finish()
    }
}

struct DescriptorInput {
    root: Element,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl Parse for DescriptorInput {
    fn parse(input: ParseStream) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::new(
                Span::call_site(),
                "descriptor! macro requires a root element",
            ));
        }
        let root = parse_element(input)?;
        if !input.is_empty() {
            return Err(input.error("descriptor! macro takes exactly one root element"));
        }
        Ok(DescriptorInput { root })
    }
}

// Segments may be Rust keywords.
fn parse_type_name(input: ParseStream) -> Result<TypeName> {
    let mut segments = vec![input.call(Ident::parse_any)?];
    while input.peek(Token![.]) {
        input.parse::<Token![.]>()?;
        segments.push(input.call(Ident::parse_any)?);
    }
    Ok(TypeName { segments })
}

fn parse_value(input: ParseStream) -> Result<Value> {
    if input.peek(syn::token::Brace) {
        let content;
        braced!(content in input);
        return Ok(Value::Expr(content.parse()?));
    }
    Ok(Value::Lit(input.parse()?))
}

fn parse_attribute(input: ParseStream) -> Result<Attribute> {
    if input.peek(Token![&]) {
        input.parse::<Token![&]>()?;
        let name: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let target: LitStr = input.parse()?;
        return Ok(Attribute::Reference { name, target });
    }
    let name: Ident = input.parse()?;
    input.parse::<Token![=]>()?;
    if name == "id" {
        return Ok(Attribute::Id(input.parse()?));
    }
    Ok(Attribute::Property {
        name,
        value: parse_value(input)?,
    })
}

fn parse_slot(input: ParseStream) -> Result<Slot> {
    let name: Ident = input.parse()?;
    input.parse::<Token![:]>()?;
    let value = if input.peek(syn::token::Bracket) {
        let content;
        bracketed!(content in input);
        let mut elements = Vec::new();
        while !content.is_empty() {
            elements.push(parse_element(&content)?);
            if content.peek(Token![,]) {
                content.parse::<Token![,]>()?;
            }
        }
        SlotValue::List(elements)
    } else {
        SlotValue::One(parse_element(input)?)
    };
    Ok(Slot { name, value })
}

/// Parse a single element from the token stream.
pub(crate) fn parse_element(input: ParseStream) -> Result<Element> {
    input.parse::<Token![<]>()?;
    let type_name = parse_type_name(input)?;

    let mut attrs = Vec::new();
    loop {
        if input.peek(Token![/]) {
            input.parse::<Token![/]>()?;
            input.parse::<Token![>]>()?;
            return Ok(Element {
                type_name,
                attrs,
                slots: Vec::new(),
            });
        }
        if input.peek(Token![>]) {
            input.parse::<Token![>]>()?;
            break;
        }
        attrs.push(parse_attribute(input)?);
    }

    let mut slots = Vec::new();
    loop {
        if input.peek(Token![<]) && input.peek2(Token![/]) {
            input.parse::<Token![<]>()?;
            input.parse::<Token![/]>()?;
            let closing = parse_type_name(input)?;
            if closing.value() != type_name.value() {
                return Err(Error::new(
                    closing.span(),
                    format!(
                        "mismatched closing tag: expected `</{}>`, found `</{}>`",
                        type_name.value(),
                        closing.value()
                    ),
                ));
            }
            input.parse::<Token![>]>()?;
            break;
        }
        if input.peek(Ident) {
            slots.push(parse_slot(input)?);
        } else {
            return Err(input.error("expected `slot: <Module ...>` or a closing tag"));
        }
    }

    Ok(Element {
        type_name,
        attrs,
        slots,
    })
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

/// Generate the builder expression for one element.
fn generate_element(elem: &Element) -> TokenStream {
    let type_name = LitStr::new(&elem.type_name.value(), elem.type_name.span());
    let mut calls = Vec::new();

    for attr in &elem.attrs {
        match attr {
            Attribute::Id(id) => calls.push(quote! { .with_id(#id) }),
            Attribute::Reference { name, target } => {
                let name = LitStr::new(&name.to_string(), name.span());
                calls.push(quote! { .with_reference(#name, #target) });
            }
            Attribute::Property { name, value } => {
                let name = LitStr::new(&name.to_string(), name.span());
                let value = match value {
                    Value::Lit(lit) => quote! { #lit },
                    Value::Expr(expr) => quote! { #expr },
                };
                calls.push(quote! { .with_property(#name, #value) });
            }
        }
    }

    for slot in &elem.slots {
        let name = LitStr::new(&slot.name.to_string(), slot.name.span());
        match &slot.value {
            SlotValue::One(child) => {
                let child = generate_element(child);
                calls.push(quote! { .with_slot(#name, #child) });
            }
            SlotValue::List(children) => {
                let children = children.iter().map(generate_element);
                calls.push(quote! { .with_slot_list(#name, vec![#(#children),*]) });
            }
        }
    }

    quote! {
        ::gilt_compose::module::ModuleNode::new(#type_name) #(#calls)*
    }
}

/// Entry point: generate code for the whole descriptor! invocation.
pub(crate) fn descriptor_impl(input: TokenStream) -> Result<TokenStream> {
    let parsed: DescriptorInput = syn::parse2(input)?;
    Ok(generate_element(&parsed.root))
}

// ===========================================================================
// Tests
// ===========================================================================
