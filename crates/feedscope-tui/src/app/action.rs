/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Close the topmost overlay or message
    Back,
    ToggleHelp,

    // Filter input
    OpenSearch,
    CloseSearch,
    SearchInput(char),
    SearchPaste(String),
    SearchBackspace,
    SearchClear,

    // Filtering
    ApplyFilter,
    ClearFilter,
    ToggleHideInternal,

    // Feed actions
    ClearMessages,
    ExportMessages,

    // Scrolling
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    ToggleFollow,

    // Render request
    Render,
}
