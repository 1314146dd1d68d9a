//! Rendering Module
//!
//! Serializes the response envelope to bytes, as a pure function of the
//! envelope: nothing outside [`FcsResponse`] reaches the output.
//!
//! ## Packings
//! - **xml**: the SRU response document for the envelope's version. Version
//!   1.2 uses the classic SRW namespace and renders result rows as KWIC
//!   data views; version 2.0 uses the search-ws namespaces and renders rows
//!   as hits token streams. Diagnostics carry integer codes in 1.2 and SRW
//!   URIs in 2.0.
//! - **string**: a line-oriented plain-text rendering of the same envelope.

use crate::protocol::response::{
    FcsResponse, Operation, RecordPacking, RowContent, SearchRow,
};

use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;


const EXPLAIN_SCHEMA: &str = "http://explain.z3950.org/dtd/2.0/";
const RECORD_SCHEMA_V12: &str = "http://clarin.eu/fcs/1.0";
const RECORD_SCHEMA_V20: &str = "http://clarin.eu/fcs/resource";
const KWIC_NS: &str = "http://clarin.eu/fcs/1.0/kwic";
const HITS_NS: &str = "http://clarin.eu/fcs/dataview/hits";
const ENDPOINT_DESCRIPTION_NS: &str = "http://clarin.eu/fcs/endpoint-description";

/// Serialize the envelope in its negotiated packing.
pub fn render(response: &FcsResponse) -> Result<Vec<u8>> {
    match response.record_packing {
        RecordPacking::Xml => render_xml(response),
        RecordPacking::Str => Ok(render_text(response).into_bytes()),
    }
}

/// SRU namespace prefix and URI for the envelope's version.
fn sru_ns(response: &FcsResponse) -> (&'static str, &'static str) {
    if response.version == "2.0" {
        (
            "sruResponse",
            "http://docs.oasis-open.org/ns/search-ws/sruResponse",
        )
    } else {
        ("sru", "http://www.loc.gov/zing/srw/")
    }
}

fn diag_ns(response: &FcsResponse) -> &'static str {
    if response.version == "2.0" {
        "http://docs.oasis-open.org/ns/search-ws/diagnostic"
    } else {
        "http://www.loc.gov/zing/srw/diagnostic/"
    }
}

pub fn render_xml(response: &FcsResponse) -> Result<Vec<u8>> {
    // No indentation: hits rows are mixed content and extra whitespace would
    // change their token spacing.
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let (prefix, ns) = sru_ns(response);
    let root_name = format!(
        "{}:{}",
        prefix,
        match response.operation {
            Operation::Explain => "explainResponse",
            Operation::Scan => "scanResponse",
            Operation::SearchRetrieve => "searchRetrieveResponse",
        }
    );
    let xmlns = format!("xmlns:{}", prefix);
    let mut root = BytesStart::new(root_name.as_str());
    root.push_attribute((xmlns.as_str(), ns));
    writer.write_event(Event::Start(root))?;

    text_element(
        &mut writer,
        &format!("{}:version", prefix),
        &response.version,
    )?;

    match response.operation {
        Operation::Explain => write_explain(&mut writer, prefix, response)?,
        Operation::SearchRetrieve => write_search_retrieve(&mut writer, prefix, response)?,
        Operation::Scan => {}
    }
    write_diagnostics(&mut writer, prefix, response)?;

    writer.write_event(Event::End(BytesEnd::new(root_name.as_str())))?;
    Ok(writer.into_inner())
}

fn write_explain(
    writer: &mut Writer<Vec<u8>>,
    prefix: &str,
    response: &FcsResponse,
) -> Result<()> {
    open(writer, &format!("{}:record", prefix))?;
    text_element(writer, &format!("{}:recordSchema", prefix), EXPLAIN_SCHEMA)?;
    text_element(
        writer,
        &format!("{}:recordPacking", prefix),
        response.record_packing.as_str(),
    )?;
    open(writer, &format!("{}:recordData", prefix))?;

    let mut explain = BytesStart::new("zr:explain");
    explain.push_attribute(("xmlns:zr", EXPLAIN_SCHEMA));
    writer.write_event(Event::Start(explain))?;

    let mut server_info = BytesStart::new("zr:serverInfo");
    server_info.push_attribute(("protocol", "FCS"));
    server_info.push_attribute(("version", response.version.as_str()));
    writer.write_event(Event::Start(server_info))?;
    text_element(writer, "zr:host", &response.explain.server_name)?;
    text_element(writer, "zr:port", &response.explain.server_port)?;
    text_element(writer, "zr:database", &response.explain.database)?;
    close(writer, "zr:serverInfo")?;

    open(writer, "zr:databaseInfo")?;
    text_element(writer, "zr:title", &response.explain.database_title)?;
    text_element(
        writer,
        "zr:description",
        &response.explain.database_description,
    )?;
    close(writer, "zr:databaseInfo")?;

    open(writer, "zr:configInfo")?;
    setting(writer, "maximumRecords", response.maximum_records)?;
    setting(writer, "maximumTerms", response.maximum_terms)?;
    close(writer, "zr:configInfo")?;

    close(writer, "zr:explain")?;
    close(writer, &format!("{}:recordData", prefix))?;
    close(writer, &format!("{}:record", prefix))?;

    if !response.resources.is_empty() {
        write_endpoint_description(writer, prefix, response)?;
    }
    Ok(())
}

fn write_endpoint_description(
    writer: &mut Writer<Vec<u8>>,
    prefix: &str,
    response: &FcsResponse,
) -> Result<()> {
    open(writer, &format!("{}:extraResponseData", prefix))?;

    let mut description = BytesStart::new("ed:EndpointDescription");
    description.push_attribute(("xmlns:ed", ENDPOINT_DESCRIPTION_NS));
    description.push_attribute(("version", "2"));
    writer.write_event(Event::Start(description))?;

    open(writer, "ed:Capabilities")?;
    text_element(
        writer,
        "ed:Capability",
        "http://clarin.eu/fcs/capability/basic-search",
    )?;
    close(writer, "ed:Capabilities")?;

    open(writer, "ed:Resources")?;
    for resource in &response.resources {
        let mut element = BytesStart::new("ed:Resource");
        element.push_attribute(("pid", resource.pid.as_str()));
        writer.write_event(Event::Start(element))?;
        text_element(writer, "ed:Title", &resource.title)?;
        if !resource.description.is_empty() {
            text_element(writer, "ed:Description", &resource.description)?;
        }
        if !resource.uri.is_empty() {
            text_element(writer, "ed:LandingPageURI", &resource.uri)?;
        }
        if !resource.languages.is_empty() {
            open(writer, "ed:Languages")?;
            for language in &resource.languages {
                text_element(writer, "ed:Language", language)?;
            }
            close(writer, "ed:Languages")?;
        }
        close(writer, "ed:Resource")?;
    }
    close(writer, "ed:Resources")?;

    close(writer, "ed:EndpointDescription")?;
    close(writer, &format!("{}:extraResponseData", prefix))?;
    Ok(())
}

fn write_search_retrieve(
    writer: &mut Writer<Vec<u8>>,
    prefix: &str,
    response: &FcsResponse,
) -> Result<()> {
    text_element(
        writer,
        &format!("{}:numberOfRecords", prefix),
        &response.rows.len().to_string(),
    )?;
    if response.rows.is_empty() {
        return Ok(());
    }

    let schema = if response.version == "2.0" {
        RECORD_SCHEMA_V20
    } else {
        RECORD_SCHEMA_V12
    };

    open(writer, &format!("{}:records", prefix))?;
    for row in &response.rows {
        open(writer, &format!("{}:record", prefix))?;
        text_element(writer, &format!("{}:recordSchema", prefix), schema)?;
        text_element(
            writer,
            &format!("{}:recordPacking", prefix),
            response.record_packing.as_str(),
        )?;
        open(writer, &format!("{}:recordData", prefix))?;
        write_row(writer, schema, row)?;
        close(writer, &format!("{}:recordData", prefix))?;
        text_element(
            writer,
            &format!("{}:recordPosition", prefix),
            &row.position.to_string(),
        )?;
        close(writer, &format!("{}:record", prefix))?;
    }
    close(writer, &format!("{}:records", prefix))?;
    Ok(())
}

fn write_row(writer: &mut Writer<Vec<u8>>, schema: &str, row: &SearchRow) -> Result<()> {
    let mut resource = BytesStart::new("fcs:Resource");
    resource.push_attribute(("xmlns:fcs", schema));
    resource.push_attribute(("pid", row.pid.as_str()));
    if !row.web.is_empty() {
        resource.push_attribute(("web", row.web.as_str()));
    }
    if !row.ref_uri.is_empty() {
        resource.push_attribute(("ref", row.ref_uri.as_str()));
    }
    writer.write_event(Event::Start(resource))?;

    match &row.content {
        RowContent::Kwic { left, kwic, right } => {
            let mut view = BytesStart::new("fcs:DataView");
            view.push_attribute(("type", "kwic"));
            writer.write_event(Event::Start(view))?;

            let mut kwic_root = BytesStart::new("kwic:kwic");
            kwic_root.push_attribute(("xmlns:kwic", KWIC_NS));
            writer.write_event(Event::Start(kwic_root))?;

            let mut c = BytesStart::new("kwic:c");
            c.push_attribute(("type", "left"));
            writer.write_event(Event::Start(c))?;
            writer.write_event(Event::Text(BytesText::new(left)))?;
            close(writer, "kwic:c")?;

            text_element(writer, "kwic:kw", kwic)?;

            let mut c = BytesStart::new("kwic:c");
            c.push_attribute(("type", "right"));
            writer.write_event(Event::Start(c))?;
            writer.write_event(Event::Text(BytesText::new(right)))?;
            close(writer, "kwic:c")?;

            close(writer, "kwic:kwic")?;
            close(writer, "fcs:DataView")?;
        }
        RowContent::Tokens(tokens) => {
            open(writer, "fcs:ResourceFragment")?;
            let mut view = BytesStart::new("fcs:DataView");
            view.push_attribute(("type", "application/x-clarin-fcs-hits+xml"));
            writer.write_event(Event::Start(view))?;

            let mut result = BytesStart::new("hits:Result");
            result.push_attribute(("xmlns:hits", HITS_NS));
            writer.write_event(Event::Start(result))?;
            for (i, token) in tokens.iter().enumerate() {
                if i > 0 {
                    writer.write_event(Event::Text(BytesText::new(" ")))?;
                }
                if token.hit {
                    text_element(writer, "hits:Hit", &token.text)?;
                } else {
                    writer.write_event(Event::Text(BytesText::new(&token.text)))?;
                }
            }
            close(writer, "hits:Result")?;

            close(writer, "fcs:DataView")?;
            close(writer, "fcs:ResourceFragment")?;
        }
    }

    close(writer, "fcs:Resource")?;
    Ok(())
}

fn write_diagnostics(
    writer: &mut Writer<Vec<u8>>,
    prefix: &str,
    response: &FcsResponse,
) -> Result<()> {
    if response.diagnostics.is_empty() {
        return Ok(());
    }

    open(writer, &format!("{}:diagnostics", prefix))?;
    for diagnostic in &response.diagnostics {
        let mut element = BytesStart::new("diag:diagnostic");
        element.push_attribute(("xmlns:diag", diag_ns(response)));
        writer.write_event(Event::Start(element))?;
        if response.version == "2.0" {
            text_element(writer, "diag:uri", &diagnostic.dtype.uri_v20())?;
        } else {
            text_element(
                writer,
                "diag:code",
                &diagnostic.dtype.code_v12().to_string(),
            )?;
        }
        text_element(writer, "diag:details", &diagnostic.ident)?;
        text_element(writer, "diag:message", &diagnostic.message)?;
        close(writer, "diag:diagnostic")?;
    }
    close(writer, &format!("{}:diagnostics", prefix))?;
    Ok(())
}

/// Plain-text rendering for the `string` record packing.
pub fn render_text(response: &FcsResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "fcs {} response (version {})\n",
        response.operation.as_str(),
        response.version
    ));

    match response.operation {
        Operation::Explain => {
            out.push_str(&format!(
                "server: {}:{}\n",
                response.explain.server_name, response.explain.server_port
            ));
            out.push_str(&format!(
                "database: {} ({})\n",
                response.explain.database, response.explain.database_title
            ));
            if !response.explain.database_description.is_empty() {
                out.push_str(&format!(
                    "description: {}\n",
                    response.explain.database_description
                ));
            }
            for resource in &response.resources {
                out.push_str(&format!(
                    "resource {}: {} [{}]\n",
                    resource.pid,
                    resource.title,
                    resource.languages.join(",")
                ));
            }
        }
        Operation::SearchRetrieve => {
            out.push_str(&format!("records: {}\n", response.rows.len()));
            for row in &response.rows {
                match &row.content {
                    RowContent::Kwic { left, kwic, right } => {
                        out.push_str(&format!(
                            "{} {}: {} | {} | {}\n",
                            row.position, row.pid, left, kwic, right
                        ));
                    }
                    RowContent::Tokens(tokens) => {
                        let words: Vec<String> = tokens
                            .iter()
                            .map(|t| {
                                if t.hit {
                                    format!("[{}]", t.text)
                                } else {
                                    t.text.clone()
                                }
                            })
                            .collect();
                        out.push_str(&format!(
                            "{} {}: {}\n",
                            row.position,
                            row.pid,
                            words.join(" ")
                        ));
                    }
                }
            }
        }
        Operation::Scan => {}
    }

    for diagnostic in &response.diagnostics {
        out.push_str(&format!(
            "diagnostic[{}] {}: {}\n",
            diagnostic.dtype.number(),
            diagnostic.ident,
            diagnostic.message
        ));
    }
    out
}

fn setting(writer: &mut Writer<Vec<u8>>, name: &str, value: usize) -> Result<()> {
    let mut element = BytesStart::new("zr:setting");
    element.push_attribute(("type", name));
    writer.write_event(Event::Start(element))?;
    writer.write_event(Event::Text(BytesText::new(&value.to_string())))?;
    close(writer, "zr:setting")
}

fn open(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn close(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    open(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    close(writer, name)?;
    Ok(())
}
