//! Keyword search, search history and favorites on rendered results.

use crate::api::StudioApi;
use crate::cards::{clipboard_text, render_cards, HadithCard};
use crate::models::{Hadith, SearchHistoryEntry};
use crate::notify::ToastKind;
use crate::session::Session;
use crate::store::ClientStore;
use crate::view::StudioView;
use crate::{Result, StudioError};
use log::{info, warn};
use std::sync::Arc;

pub const MIN_KEYWORD_CHARS: usize = 2;

const MSG_EMPTY_KEYWORD: &str = "الرجاء إدخال كلمة مفتاحية للبحث";
const MSG_SHORT_KEYWORD: &str = "كلمة البحث قصيرة جداً، الرجاء إدخال حرفين على الأقل";
const MSG_NO_RESULTS: &str = "لم يتم العثور على نتائج. جرب كلمة بحث أخرى.";
const MSG_TIMEOUT: &str = "انتهت مهلة البحث. الرجاء المحاولة مرة أخرى.";
const MSG_OFFLINE: &str = "لا يوجد اتصال بالإنترنت. تحقق من اتصالك وحاول مرة أخرى.";

pub struct SearchController {
    api: Arc<dyn StudioApi>,
    view: Arc<dyn StudioView>,
    store: Arc<ClientStore>,
    session: Arc<Session>,
}

impl SearchController {
    pub fn new(
        api: Arc<dyn StudioApi>,
        view: Arc<dyn StudioView>,
        store: Arc<ClientStore>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            api,
            view,
            store,
            session,
        }
    }

    /// Runs a search and renders the results.
    ///
    /// No results is not an error: the result list comes back empty and the
    /// results view is hidden.
    pub fn search(&self, keyword: &str) -> Result<Vec<Hadith>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(self.reject(MSG_EMPTY_KEYWORD));
        }
        if keyword.chars().count() < MIN_KEYWORD_CHARS {
            return Err(self.reject(MSG_SHORT_KEYWORD));
        }

        self.session.set_last_keyword(keyword);
        self.view.show_loading("جاري البحث عن الأحاديث...");
        if let Err(e) = self.store.record_search(keyword) {
            warn!("failed to record search history: {e}");
        }
        let result = self.api.search(keyword);
        self.view.hide_loading();

        let hadiths = match result {
            Ok(h) => h,
            Err(e) => {
                warn!("search for {keyword:?} failed: {e}");
                let message = match &e {
                    StudioError::Timeout => MSG_TIMEOUT.to_string(),
                    StudioError::Offline(_) => MSG_OFFLINE.to_string(),
                    other => format!("خطأ في البحث: {}", other.user_message()),
                };
                self.view.show_error(&message);
                return Err(e);
            }
        };

        self.session.set_results(hadiths.clone());
        if hadiths.is_empty() {
            self.view.show_error(MSG_NO_RESULTS);
            self.view.hide_results();
            return Ok(hadiths);
        }

        info!("search for {keyword:?} returned {} hadiths", hadiths.len());
        self.render();
        self.view.notify(
            ToastKind::Success,
            &format!("تم العثور على {} حديث", hadiths.len()),
        );
        Ok(hadiths)
    }

    /// Reruns the n-th entry of the search history (most recent first).
    pub fn search_from_history(&self, index: usize) -> Result<Vec<Hadith>> {
        let Some(entry) = self.store.search_history().into_iter().nth(index) else {
            return Err(StudioError::Validation(format!(
                "لا توجد عملية بحث برقم {}",
                index + 1
            )));
        };
        self.search(&entry.keyword)
    }

    pub fn history(&self) -> Vec<SearchHistoryEntry> {
        self.store.search_history()
    }

    pub fn clear_history(&self) -> Result<()> {
        self.store.clear_search_history()?;
        self.view.notify(ToastKind::Info, "تم مسح سجل البحث");
        Ok(())
    }

    /// Cards for the current results, with favorite flags from the store.
    pub fn cards(&self) -> Vec<HadithCard> {
        render_cards(&self.session.results(), &self.store.favorites())
    }

    /// Flips the favorite state of the n-th result and re-renders.
    pub fn toggle_favorite(&self, index: usize) -> Result<bool> {
        let Some(hadith) = self.session.result_at(index) else {
            return Err(StudioError::Validation(format!("لا يوجد حديث برقم {}", index + 1)));
        };
        let now_favorite = self.store.toggle_favorite(&hadith)?;
        if now_favorite {
            self.view.notify(ToastKind::Success, "تم إضافة الحديث للمفضلة");
        } else {
            self.view.notify(ToastKind::Info, "تم إزالة الحديث من المفضلة");
        }
        self.render();
        Ok(now_favorite)
    }

    /// Text to put on the clipboard for the n-th result.
    pub fn copy_text(&self, index: usize) -> Option<String> {
        self.session.result_at(index).map(|h| clipboard_text(&h))
    }

    fn render(&self) {
        self.view.show_results(&self.cards());
    }

    fn reject(&self, message: &str) -> StudioError {
        self.view.show_error(message);
        StudioError::Validation(message.to_string())
    }
}
