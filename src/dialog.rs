// Which modal panels are up. Drawing them is ui.rs's job; this only tracks
// visibility. The dimmed backdrop is shown while any dialog is open.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialog {
    /// "Loading..." while an overlay frame decodes.
    Loading,
    /// The composited photo with Save / Close.
    Result,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dialogs {
    loading: bool,
    result: bool,
}

impl Dialogs {
    pub fn show(&mut self, dialog: Dialog) {
        log::debug!("dialog show {dialog:?}");
        *self.slot(dialog) = true;
    }

    pub fn hide(&mut self, dialog: Dialog) {
        log::debug!("dialog hide {dialog:?}");
        *self.slot(dialog) = false;
    }

    pub fn is_visible(&self, dialog: Dialog) -> bool {
        match dialog {
            Dialog::Loading => self.loading,
            Dialog::Result => self.result,
        }
    }

    /// Backdrop visibility; hiding one dialog never hides another's backdrop.
    pub fn backdrop_visible(&self) -> bool {
        self.loading || self.result
    }

    fn slot(&mut self, dialog: Dialog) -> &mut bool {
        match dialog {
            Dialog::Loading => &mut self.loading,
            Dialog::Result => &mut self.result,
        }
    }
}
