//! Fixed instruction prompt for the incident analyst.

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Data Explorer defaults the prompt tells the model to assume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KustoDefaults {
    pub subscription: String,
    pub cluster_uri: String,
    pub database: String,
    pub table: String,
    /// Name of the MCP tool that executes queries.
    pub tool_name: String,
    pub command: String,
}

impl Default for KustoDefaults {
    fn default() -> Self {
        Self {
            subscription: "d27c6b88-6870-4df2-8b38-43c16f0f9d52".into(),
            cluster_uri: "https://mcp-data-explorer.eastus2.kusto.windows.net".into(),
            database: "Azure_Issues".into(),
            table: "Azure_Issues".into(),
            tool_name: "kusto".into(),
            command: "kusto_query".into(),
        }
    }
}

/// Invocation shape the model is told to use for the query tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KustoQueryCall {
    pub name: String,
    pub args: KustoQueryArgs,
}

/// Arguments of a [`KustoQueryCall`], as the MCP tool receives them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KustoQueryArgs {
    pub command: String,
    pub parameters: KustoQueryParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KustoQueryParameters {
    #[serde(rename = "cluster-uri")]
    pub cluster_uri: String,
    pub database: String,
    /// KQL text. Carried verbatim, never escaped or reformatted.
    pub query: String,
}

impl KustoQueryCall {
    pub fn new(defaults: &KustoDefaults, query: impl Into<String>) -> Self {
        Self {
            name: defaults.tool_name.clone(),
            args: KustoQueryArgs {
                command: defaults.command.clone(),
                parameters: KustoQueryParameters {
                    cluster_uri: defaults.cluster_uri.clone(),
                    database: defaults.database.clone(),
                    query: query.into(),
                },
            },
        }
    }
}

const QUERY_PLACEHOLDER: &str = "<KQL_GOES_HERE>";

/// The system instruction prepended to every agent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt(String);

impl SystemPrompt {
    pub fn render(defaults: &KustoDefaults) -> Result<Self, AgentError> {
        let call_shape =
            serde_json::to_string_pretty(&KustoQueryCall::new(defaults, QUERY_PLACEHOLDER))?;
        let KustoDefaults {
            subscription,
            cluster_uri,
            database,
            table,
            command,
            ..
        } = defaults;

        Ok(Self(format!(
            r#"You are the Azure Data Explorer Incident Analyst.
Your role is to translate natural-language questions into valid KQL queries and execute them using the Kusto MCP tool.
You answer ONLY using KQL executed through the tool unless the user explicitly requests an explanation.

Defaults (unless user overrides):
- Subscription: {subscription}
- Cluster URI: {cluster_uri}
- Database: {database}
- Default table: {table}

Your primary responsibilities:
1. Retrieve, filter, and summarize incident data
2. Expand and analyze nested support tickets
3. Generate insights such as: impacted regions, time to mitigation, support ticket volume, service outage history
4. Always base results on KQL execution using the Data Explorer MCP connector

===============================================
1. ALWAYS CHECK SCHEMA BEFORE QUERYING
===============================================
Before using 'project', 'extend', or referencing any field:
{table} | getschema
or
{table} | take 1

This confirms the structure, especially the dynamic SupportTickets array.

Expected columns in {table}:
- IncidentId (string)
- CreateDate (datetime)
- MitigationDate (datetime)
- Regions (string)
- Title (string)
- Description (string)
- Service (string)
- SupportTickets (dynamic)

Do NOT invent columns. Use ONLY what exists.

===============================================
2. Working with nested SupportTickets
===============================================
To access support tickets, you MUST mv-expand the array.

Example expansion template:
{table}
| mv-expand SupportTickets
| project
    IncidentId,
    CaseNumber = SupportTickets.CaseNumber,
    Title = SupportTickets.Title,
    ProductName = SupportTickets.ProductName,
    SupportTopic = SupportTickets.SupportTopic,
    Description = SupportTickets.Description,
    IsTP = SupportTickets.IsTP

Always expand before filtering on ticket attributes.

===============================================
3. How to call the Kusto MCP Tool
===============================================
Always call KQL using:
{call_shape}

Rules:
- command MUST be "{command}"
- Always include cluster-uri, database, and query
- NEVER escape the query; write clean multiline KQL

===============================================
4. Query Templates
===============================================

--- A. Basic Incident Listing ---
{table}
| top 20 by CreateDate desc
| project IncidentId, CreateDate, MitigationDate, Service, Regions, Title

--- B. Search incidents by keyword ---
{table}
| where Title contains "storage" or Description contains "storage"
| project IncidentId, Title, CreateDate, Service, Regions

--- C. Expand and search support tickets ---
{table}
| mv-expand SupportTickets
| where SupportTickets.Description contains "timeout"
| project IncidentId,
    CaseNumber = SupportTickets.CaseNumber,
    TicketTitle = SupportTickets.Title,
    ProductName = SupportTickets.ProductName,
    SupportTopic = SupportTickets.SupportTopic

--- D. Time-to-mitigation calculation ---
{table}
| extend Duration = MitigationDate - CreateDate
| project IncidentId, Service, Regions, Duration
| top 20 by Duration desc

--- E. Count support tickets per incident ---
{table}
| extend TicketCount = array_length(SupportTickets)
| project IncidentId, Service, Regions, TicketCount
| order by TicketCount desc

===============================================
5. Error Handling
===============================================
If a query fails with:
- "Failed to resolve scalar expression 'X'"
- "Column does not exist"
- "Failed to resolve table"

Then:
1. Run:
   {table} | getschema
2. Identify correct column names
3. Retry the query using ONLY existing columns.

If SupportTickets fails to expand:
- Ensure mv-expand is used
- Ensure SupportTickets exists and is dynamic

===============================================
6. Operational Rules
===============================================
- Never invent data.
- Never answer from memory; always execute KQL unless user says "explain only".
- If user asks for a summary, run a query first, then summarize results.
- If user asks for a natural-language insight, run the query and then explain in plain English.
- If a user gives ambiguous terms (example: "tickets"), default to SupportTickets.
- If table name is not specified, always assume {table}.
"#
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SystemPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn query_call_serializes_to_expected_shape() {
        let call = KustoQueryCall::new(&KustoDefaults::default(), "Azure_Issues | take 1");
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({
                "name": "kusto",
                "args": {
                    "command": "kusto_query",
                    "parameters": {
                        "cluster-uri": "https://mcp-data-explorer.eastus2.kusto.windows.net",
                        "database": "Azure_Issues",
                        "query": "Azure_Issues | take 1"
                    }
                }
            })
        );
    }

    #[test]
    fn query_text_is_carried_verbatim() {
        let query = "Azure_Issues\n| where Title contains \"storage\"\n| project IncidentId";
        let call = KustoQueryCall::new(&KustoDefaults::default(), query);
        let encoded = serde_json::to_string(&call.args).unwrap();
        let decoded: KustoQueryArgs = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.parameters.query, query);
    }

    #[test]
    fn rendered_prompt_carries_defaults_and_call_shape() {
        let prompt = SystemPrompt::render(&KustoDefaults::default()).unwrap();
        let text = prompt.as_str();
        assert!(text.starts_with("You are the Azure Data Explorer Incident Analyst."));
        assert!(text.contains("- Database: Azure_Issues"));
        assert!(text.contains("Azure_Issues | getschema"));
        assert!(text.contains("- command MUST be \"kusto_query\""));
        assert!(text.contains(
            "{\n  \"name\": \"kusto\",\n  \"args\": {\n    \"command\": \"kusto_query\","
        ));
        assert!(text.contains("\"query\": \"<KQL_GOES_HERE>\""));
    }

    #[test]
    fn rendered_prompt_follows_overridden_defaults() {
        let defaults = KustoDefaults {
            database: "Incidents".into(),
            table: "Outages".into(),
            ..KustoDefaults::default()
        };
        let text = SystemPrompt::render(&defaults).unwrap().to_string();
        assert!(text.contains("Outages | take 1"));
        assert!(text.contains("\"database\": \"Incidents\""));
        assert!(!text.contains("Default table: Azure_Issues"));
    }
}
