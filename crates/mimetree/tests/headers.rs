//! Integration tests for the header store: ordered access, structured
//! value/parameter editing, and serialization of the header block.

use mimetree::Part;

#[test]
fn test_set_and_get_headers() {
    let mut part = Part::new();
    assert!(part.headers().is_empty());

    part.set_header("foo", "bar");
    assert_eq!(part.header("foo"), Some("bar"));
    assert_eq!(part.header_value("foo"), "bar");
    assert_eq!(part.header_parameter("foo", ""), None);
    assert_eq!(part.header_parameter("foo", "foo"), None);
    assert_eq!(part.render().unwrap(), "foo: bar\r\n\r\n");

    part.set_header("baz", "quux");
    assert_eq!(part.header("baz"), Some("quux"));
    assert_eq!(part.header_value("baz"), "quux");
    assert_eq!(part.render().unwrap(), "foo: bar\r\nbaz: quux\r\n\r\n");

    // Changing an existing header keeps its position.
    part.set_header("foo", "bar2");
    assert_eq!(part.header("foo"), Some("bar2"));
    assert_eq!(part.render().unwrap(), "foo: bar2\r\nbaz: quux\r\n\r\n");
}

#[test]
fn test_header_parameters() {
    let mut part = Part::new();
    part.set_header("baz", "quux");

    // Add a parameter to an existing header.
    part.set_header_parameter("baz", "parameter", "value");
    assert_eq!(part.header("baz"), Some("quux; parameter=value"));
    assert_eq!(part.header_value("baz"), "quux");
    assert_eq!(
        part.header_parameter("baz", "parameter").as_deref(),
        Some("value")
    );

    // Replace it.
    part.set_header_parameter("baz", "parameter", "value2");
    assert_eq!(part.header("baz"), Some("quux; parameter=value2"));
    assert_eq!(part.header_value("baz"), "quux");
    assert_eq!(
        part.header_parameter("baz", "parameter").as_deref(),
        Some("value2")
    );

    // A second parameter goes at the end.
    part.set_header_parameter("baz", "foo", "bar");
    assert_eq!(part.header("baz"), Some("quux; parameter=value2; foo=bar"));
    assert_eq!(
        part.header_parameter("baz", "parameter").as_deref(),
        Some("value2")
    );
    assert_eq!(part.header_parameter("baz", "foo").as_deref(), Some("bar"));

    // Setting a parameter on a missing header creates it with an
    // empty value part.
    part.set_header_parameter("aap", "noot", "mies");
    assert_eq!(part.header("aap"), Some("; noot=mies"));
    assert_eq!(part.header_value("aap"), "");
    assert_eq!(part.header_parameter("aap", "noot").as_deref(), Some("mies"));

    // Changing the value leaves the parameters alone.
    part.set_header_value("baz", "quux2");
    assert_eq!(part.header("baz"), Some("quux2; parameter=value2; foo=bar"));

    part.set_header_value("a", "b");
    assert_eq!(part.header("a"), Some("b"));
}

#[test]
fn test_quoted_parameters() {
    let mut part = Part::new();
    part.set_header("Content-Disposition", "attachment");
    part.set_header_parameter("Content-Disposition", "filename", "two words.txt");
    assert_eq!(
        part.header("Content-Disposition"),
        Some("attachment; filename=\"two words.txt\"")
    );
    assert_eq!(
        part.header_parameter("Content-Disposition", "filename")
            .as_deref(),
        Some("two words.txt")
    );

    // A quoted parameter containing a semicolon must not hide the
    // parameters after it.
    part.set_header(
        "Content-Type",
        "text/plain; name=\"a;b\"; charset=us-ascii",
    );
    assert_eq!(
        part.header_parameter("Content-Type", "charset").as_deref(),
        Some("us-ascii")
    );
    assert_eq!(
        part.header_parameter("Content-Type", "name").as_deref(),
        Some("a;b")
    );
}

#[test]
fn test_header_order_and_duplicates() {
    let mut part = Part::new();
    part.set_header("foo", "bar");
    part.set_header("baz", "quux2; parameter=value2; foo=bar");
    part.set_header_parameter("aap", "noot", "mies");

    part.append_header("insert", "back");
    assert_eq!(part.header("insert"), Some("back"));

    // Prepending shadows the existing entry for lookups.
    part.prepend_header("insert", "front");
    assert_eq!(part.header("insert"), Some("front"));

    let entries = part.headers().entries();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].1, "front");
    assert_eq!(entries[1].0, "foo");
    assert_eq!(entries[2].0, "baz");
    assert_eq!(entries[3].0, "aap");
    assert_eq!(entries[3].1, "; noot=mies");
    assert_eq!(entries[4].1, "back");

    // A header set to the empty string is kept but not serialized.
    part.set_header("foo", "");
    assert_eq!(part.header("foo"), Some(""));
    assert_eq!(
        part.render().unwrap(),
        "insert: front\r\n\
         baz: quux2; parameter=value2; foo=bar\r\n\
         aap: ; noot=mies\r\n\
         insert: back\r\n\
         \r\n"
    );

    // Erasing removes every entry of the field.
    part.erase_header("insert");
    assert_eq!(part.header("insert"), None);
    assert_eq!(
        part.render().unwrap(),
        "baz: quux2; parameter=value2; foo=bar\r\n\
         aap: ; noot=mies\r\n\
         \r\n"
    );

    part.clear_headers();
    assert!(part.headers().is_empty());
    assert_eq!(part.header("baz"), None);
    assert_eq!(part.render().unwrap(), "\r\n");
}

#[test]
fn test_case_insensitive_lookup() {
    let mut part = Part::new();
    part.set_header("Content-Type", "text/plain; charset=utf-8");
    assert_eq!(part.header("content-type"), Some("text/plain; charset=utf-8"));
    assert_eq!(part.header_value("CONTENT-TYPE"), "text/plain");
    assert_eq!(
        part.header_parameter("content-TYPE", "CHARSET").as_deref(),
        Some("utf-8")
    );

    // Updating through a differently-cased name keeps the original
    // spelling.
    part.set_header("content-type", "text/html");
    assert_eq!(part.headers().entries()[0].0, "Content-Type");
    assert_eq!(part.header_value("Content-Type"), "text/html");

    part.erase_header("CONTENT-TYPE");
    assert_eq!(part.header("Content-Type"), None);
}
