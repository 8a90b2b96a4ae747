//! XPath-driven field-level encryption over XML documents.
//!
//! Matched nodes keep their place in the tree. An element whose content is
//! markup (it has child elements) is collapsed to a single text node holding
//! the encryption of its serialized inner markup; an element with plain
//! content has its text value encrypted in place. Attribute and text-node
//! matches are rewritten in place. Decryption attempts to re-parse the
//! plaintext as inner markup, falling back to a literal text value, and
//! leaves values that are not envelopes untouched.

use encbox::{Crypto, CryptoError, Decryptor, Encryptor};
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Document, Element};
use sxd_document::{parser, writer};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value as XPathValue, XPath};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::{
    crypto_failure, ensure_live, ensure_path_present, is_envelope_string, LazyHandle,
};
use crate::error::FieldError;

/// Encrypt every node matched by `paths`, in input order.
///
/// # Errors
///
/// [`FieldError::NoPaths`] for an empty list, [`FieldError::InvalidPath`]
/// for a blank or uncompilable expression, [`FieldError::Crypto`] when a
/// per-field operation fails (earlier rewrites are not rolled back).
pub fn encrypt(
    crypto: &Crypto,
    document: &str,
    paths: &[String],
    credential: Option<&str>,
) -> Result<String, FieldError> {
    encrypt_with_cancel(crypto, document, paths, credential, &CancellationToken::new())
}

/// [`encrypt`] with a cancellation signal, checked before each per-field
/// crypto operation.
pub fn encrypt_with_cancel(
    crypto: &Crypto,
    document: &str,
    paths: &[String],
    credential: Option<&str>,
    cancel: &CancellationToken,
) -> Result<String, FieldError> {
    if paths.is_empty() {
        return Err(FieldError::NoPaths);
    }
    let package = parse_document(document)?;
    let doc = package.as_document();
    let factory = Factory::new();
    let context = Context::new();
    let mut encryptor = LazyHandle::new();

    for (index, path) in paths.iter().enumerate() {
        let xpath = compile_xpath(&factory, index, path)?;
        let matches = select(&xpath, &context, doc, index)?;
        debug!(path = %path, matches = matches.len(), "XPath evaluated");
        for (match_index, node) in matches.into_iter().enumerate() {
            ensure_live(cancel)?;
            let enc = encryptor
                .get_or_init(|| crypto.encryptor(credential))
                .map_err(|e| crypto_failure(path, match_index, e))?;
            encrypt_node(doc, node, enc).map_err(|e| crypto_failure(path, match_index, e))?;
        }
    }
    serialize(&doc)
}

/// Decrypt every node matched by `paths`, in input order.
///
/// Values that are not envelopes are left untouched; a value the decryptor
/// rejects aborts the call.
pub fn decrypt(
    crypto: &Crypto,
    document: &str,
    paths: &[String],
    credential: Option<&str>,
) -> Result<String, FieldError> {
    decrypt_with_cancel(crypto, document, paths, credential, &CancellationToken::new())
}

/// [`decrypt`] with a cancellation signal, checked before each per-field
/// crypto operation.
pub fn decrypt_with_cancel(
    crypto: &Crypto,
    document: &str,
    paths: &[String],
    credential: Option<&str>,
    cancel: &CancellationToken,
) -> Result<String, FieldError> {
    if paths.is_empty() {
        return Err(FieldError::NoPaths);
    }
    let package = parse_document(document)?;
    let doc = package.as_document();
    let factory = Factory::new();
    let context = Context::new();
    let mut decryptor = LazyHandle::new();

    for (index, path) in paths.iter().enumerate() {
        let xpath = compile_xpath(&factory, index, path)?;
        let matches = select(&xpath, &context, doc, index)?;
        debug!(path = %path, matches = matches.len(), "XPath evaluated");
        for (match_index, node) in matches.into_iter().enumerate() {
            ensure_live(cancel)?;
            decrypt_node(doc, node, &mut decryptor, crypto, credential)
                .map_err(|e| crypto_failure(path, match_index, e))?;
        }
    }
    serialize(&doc)
}

// ---------------------------------------------------------------------------
// Traversal helpers
// ---------------------------------------------------------------------------

fn parse_document(document: &str) -> Result<sxd_document::Package, FieldError> {
    parser::parse(document).map_err(|e| FieldError::DocumentParse {
        format: "XML",
        reason: e.to_string(),
    })
}

fn compile_xpath(factory: &Factory, index: usize, path: &str) -> Result<XPath, FieldError> {
    ensure_path_present(index, path)?;
    factory
        .build(path)
        .map_err(|e| FieldError::InvalidPath {
            index,
            reason: e.to_string(),
        })?
        .ok_or_else(|| FieldError::InvalidPath {
            index,
            reason: "expression compiled to nothing".into(),
        })
}

/// Evaluate `xpath` and snapshot the matches in document order, so rewrites
/// cannot invalidate the iteration. A non-node-set result (number, string,
/// boolean) selects nothing.
fn select<'d>(
    xpath: &XPath,
    context: &Context<'d>,
    doc: Document<'d>,
    index: usize,
) -> Result<Vec<Node<'d>>, FieldError> {
    let value = xpath
        .evaluate(context, doc.root())
        .map_err(|e| FieldError::InvalidPath {
            index,
            reason: e.to_string(),
        })?;
    match value {
        XPathValue::Nodeset(set) => Ok(set.document_order()),
        _ => {
            debug!("expression did not produce a node-set; nothing selected");
            Ok(Vec::new())
        }
    }
}

fn encrypt_node<'d>(
    doc: Document<'d>,
    node: Node<'d>,
    enc: &Encryptor,
) -> Result<(), CryptoError> {
    match node {
        Node::Element(el) => encrypt_element(doc, el, enc),
        Node::Attribute(attr) => {
            let sealed = enc.encrypt_string(attr.value())?;
            if let Some(parent) = attr.parent() {
                parent.set_attribute_value(attr.name(), &sealed);
            }
            Ok(())
        }
        Node::Text(text) => {
            let sealed = enc.encrypt_string(text.text())?;
            text.set_text(&sealed);
            Ok(())
        }
        Node::Root(root) => match document_element(root) {
            Some(el) => encrypt_element(doc, el, enc),
            None => Ok(()),
        },
        // Comments, processing instructions and namespace nodes carry no
        // field value to protect.
        _ => Ok(()),
    }
}

fn encrypt_element<'d>(
    doc: Document<'d>,
    el: Element<'d>,
    enc: &Encryptor,
) -> Result<(), CryptoError> {
    let text = text_value(el);
    let plain = if has_element_children(el) {
        let markup = inner_markup(el);
        // An element whose serialized content is more than its text value is
        // captured as markup, so decryption can rebuild the subtree.
        if markup != text {
            markup
        } else {
            text
        }
    } else {
        text
    };
    let sealed = enc.encrypt_string(&plain)?;
    set_element_text(doc, el, &sealed);
    Ok(())
}

fn decrypt_node<'d>(
    doc: Document<'d>,
    node: Node<'d>,
    decryptor: &mut LazyHandle<Decryptor>,
    crypto: &Crypto,
    credential: Option<&str>,
) -> Result<(), CryptoError> {
    match node {
        Node::Element(el) => {
            let current = text_value(el);
            if !is_envelope_string(&current) {
                debug!("element value is not an envelope; skipping");
                return Ok(());
            }
            let dec = decryptor.get_or_init(|| crypto.decryptor(credential))?;
            let plain = dec.decrypt_string(&current)?;
            apply_decrypted_markup(doc, el, &plain);
            Ok(())
        }
        Node::Attribute(attr) => {
            let current = attr.value().to_owned();
            if !is_envelope_string(&current) {
                return Ok(());
            }
            let dec = decryptor.get_or_init(|| crypto.decryptor(credential))?;
            let plain = dec.decrypt_string(&current)?;
            if let Some(parent) = attr.parent() {
                parent.set_attribute_value(attr.name(), &plain);
            }
            Ok(())
        }
        Node::Text(text) => {
            let current = text.text().to_owned();
            if !is_envelope_string(&current) {
                return Ok(());
            }
            let dec = decryptor.get_or_init(|| crypto.decryptor(credential))?;
            let plain = dec.decrypt_string(&current)?;
            text.set_text(&plain);
            Ok(())
        }
        Node::Root(root) => match document_element(root) {
            Some(el) => decrypt_node(doc, Node::Element(el), decryptor, crypto, credential),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Re-parse `plain` as inner markup and graft it under `el`; if it is not
/// well-formed markup, assign it as a literal text value.
fn apply_decrypted_markup<'d>(doc: Document<'d>, el: Element<'d>, plain: &str) {
    let wrapped = format!("<x>{plain}</x>");
    match parser::parse(&wrapped) {
        Ok(package) => {
            clear_children(el);
            let source = package.as_document();
            if let Some(source_root) = document_element(source.root()) {
                graft_children(doc, el, source_root);
            }
        }
        Err(_) => set_element_text(doc, el, plain),
    }
}

fn serialize(doc: &Document<'_>) -> Result<String, FieldError> {
    let mut out = Vec::new();
    writer::format_document(doc, &mut out).map_err(|e| FieldError::Serialize(e.to_string()))?;
    String::from_utf8(out).map_err(|e| FieldError::Serialize(e.to_string()))
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

fn document_element<'d>(root: sxd_document::dom::Root<'d>) -> Option<Element<'d>> {
    root.children().into_iter().find_map(|child| match child {
        ChildOfRoot::Element(el) => Some(el),
        _ => None,
    })
}

fn has_element_children(el: Element<'_>) -> bool {
    el.children()
        .iter()
        .any(|c| matches!(c, ChildOfElement::Element(_)))
}

/// The XPath string value of an element: all descendant text, concatenated.
fn text_value(el: Element<'_>) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    out
}

fn collect_text(el: Element<'_>, out: &mut String) {
    for child in el.children() {
        match child {
            ChildOfElement::Text(t) => out.push_str(t.text()),
            ChildOfElement::Element(e) => collect_text(e, out),
            _ => {}
        }
    }
}

fn clear_children(el: Element<'_>) {
    for child in el.children() {
        match child {
            ChildOfElement::Element(e) => e.remove_from_parent(),
            ChildOfElement::Text(t) => t.remove_from_parent(),
            ChildOfElement::Comment(c) => c.remove_from_parent(),
            ChildOfElement::ProcessingInstruction(p) => p.remove_from_parent(),
        }
    }
}

fn set_element_text<'d>(doc: Document<'d>, el: Element<'d>, text: &str) {
    clear_children(el);
    el.append_child(doc.create_text(text));
}

/// Serialize the element's children as markup, the inverse of what
/// [`apply_decrypted_markup`] re-parses.
fn inner_markup(el: Element<'_>) -> String {
    let mut out = String::new();
    for child in el.children() {
        write_child(child, &mut out);
    }
    out
}

fn write_child(child: ChildOfElement<'_>, out: &mut String) {
    match child {
        ChildOfElement::Text(t) => push_escaped_text(t.text(), out),
        ChildOfElement::Element(e) => write_element(e, out),
        ChildOfElement::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c.text());
            out.push_str("-->");
        }
        ChildOfElement::ProcessingInstruction(p) => {
            out.push_str("<?");
            out.push_str(p.target());
            if let Some(value) = p.value() {
                out.push(' ');
                out.push_str(value);
            }
            out.push_str("?>");
        }
    }
}

fn write_element(el: Element<'_>, out: &mut String) {
    let name = qualified_name(el.name().local_part(), el.preferred_prefix());
    out.push('<');
    out.push_str(&name);
    for attr in el.attributes() {
        out.push(' ');
        out.push_str(&qualified_name(
            attr.name().local_part(),
            attr.preferred_prefix(),
        ));
        out.push_str("=\"");
        push_escaped_attr(attr.value(), out);
        out.push('"');
    }
    let children = el.children();
    if children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in children {
        write_child(child, out);
    }
    out.push_str("</");
    out.push_str(&name);
    out.push('>');
}

fn qualified_name(local: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_owned(),
    }
}

fn push_escaped_text(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

fn push_escaped_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

/// Deep-copy `source`'s children under `target`, interning names and text
/// into the target document.
fn graft_children<'d>(doc: Document<'d>, target: Element<'d>, source: Element<'_>) {
    for child in source.children() {
        match child {
            ChildOfElement::Element(e) => {
                let copy = doc.create_element(e.name().local_part());
                for attr in e.attributes() {
                    copy.set_attribute_value(attr.name().local_part(), attr.value());
                }
                target.append_child(copy);
                graft_children(doc, copy, e);
            }
            ChildOfElement::Text(t) => {
                target.append_child(doc.create_text(t.text()));
            }
            ChildOfElement::Comment(c) => {
                target.append_child(doc.create_comment(c.text()));
            }
            ChildOfElement::ProcessingInstruction(p) => {
                target.append_child(doc.create_processing_instruction(p.target(), p.value()));
            }
        }
    }
}
